use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use serde::Deserialize;

use crate::gate::AccessGate;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub gate: Arc<AccessGate>,
    pub lock_timeout: Duration,
    pub busy_timeout: Duration,
}

impl AppState {
    pub fn new(gate: Arc<AccessGate>, lock_timeout: Duration, busy_timeout: Duration) -> Self {
        Self {
            workspace: None,
            db: None,
            gate,
            lock_timeout,
            busy_timeout,
        }
    }
}
