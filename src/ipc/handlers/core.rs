use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "lockTimeoutMs": state.lock_timeout.as_millis() as u64,
            "gateHeld": state.gate.is_held(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, path) {
        Ok(path) => ok(&req.id, json!({ "workspacePath": path })),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

/// Opens (creating if needed) the workspace store and makes it current.
pub fn select_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<String> {
    match db::open_db(&path, state.busy_timeout) {
        Ok(conn) => {
            info!(workspace = %path.display(), "workspace opened");
            let shown = path.to_string_lossy().to_string();
            state.workspace = Some(path);
            state.db = Some(conn);
            Ok(shown)
        }
        Err(e) => {
            error!(workspace = %path.display(), error = %e, "workspace open failed");
            Err(e)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
