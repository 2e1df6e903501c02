mod config;
mod db;
mod error;
mod gate;
mod ipc;
mod model;
mod query;
mod reconcile;
mod table;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Args, LogFormat};

fn init_logging(format: LogFormat) {
    // stdout carries IPC responses; logs must stay on stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let mut state = ipc::AppState::new(
        Arc::new(gate::AccessGate::new()),
        args.lock_timeout(),
        args.busy_timeout(),
    );
    if let Some(path) = args.workspace.clone() {
        ipc::select_workspace(&mut state, path)?;
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        lock_timeout_ms = args.lock_timeout_ms,
        "rollcalld ready"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                // Can't reply without id.
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed; shutting down");
    Ok(())
}
