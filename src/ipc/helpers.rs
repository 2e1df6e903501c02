use chrono::NaiveDate;
use rusqlite::Connection;

use super::error::HandlerErr;
use super::types::AppState;

pub fn require_db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state.db.as_ref().ok_or_else(|| HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    })
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Grouping keys arrive as strings or numbers; numbers are taken in their JSON text form.
pub fn get_required_key(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(HandlerErr::bad_params(format!(
            "{} must be a string or number",
            key
        ))),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Calendar date in `YYYY-MM-DD` form, returned unchanged.
pub fn get_required_date(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let raw = get_required_str(params, key)?;
    if raw.len() != 10 || NaiveDate::parse_from_str(&raw, "%Y-%m-%d").is_err() {
        return Err(HandlerErr::bad_params(format!(
            "{} must be YYYY-MM-DD",
            key
        )));
    }
    Ok(raw)
}
