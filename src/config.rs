use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::gate::DEFAULT_LOCK_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Attendance sidecar: one JSON request per stdin line, one response per stdout line.
#[derive(Debug, Parser)]
#[command(name = "rollcalld", version)]
pub struct Args {
    /// Workspace directory to open at startup instead of waiting for `workspace.select`.
    #[arg(long, env = "ROLLCALLD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// How long an attendance submit waits for the write gate.
    #[arg(
        long,
        env = "ROLLCALLD_LOCK_TIMEOUT_MS",
        default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64
    )]
    pub lock_timeout_ms: u64,

    /// SQLite busy timeout for a workspace file shared with other processes.
    #[arg(long, env = "ROLLCALLD_BUSY_TIMEOUT_MS", default_value_t = 5_000)]
    pub busy_timeout_ms: u64,

    /// Log line format on stderr. Filtering follows RUST_LOG.
    #[arg(long, env = "ROLLCALLD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_ten_second_gate() {
        let args = Args::try_parse_from(["rollcalld"]).expect("parse");
        assert_eq!(args.lock_timeout(), Duration::from_secs(10));
        assert_eq!(args.busy_timeout(), Duration::from_secs(5));
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "rollcalld",
            "--workspace",
            "/tmp/class-3-2",
            "--lock-timeout-ms",
            "250",
            "--log-format",
            "json",
        ])
        .expect("parse");
        assert_eq!(args.workspace, Some(PathBuf::from("/tmp/class-3-2")));
        assert_eq!(args.lock_timeout(), Duration::from_millis(250));
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Args::try_parse_from(["rollcalld", "--lock-timeout-ms", "soon"]).is_err());
    }
}
