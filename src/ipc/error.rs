use serde_json::json;

use crate::error::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let details = e.retryable().then(|| json!({ "retryable": true }));
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

impl From<serde_json::Error> for HandlerErr {
    fn from(e: serde_json::Error) -> Self {
        Self {
            code: "encode_failed",
            message: e.to_string(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_errors_carry_retryable_details() {
        let e = HandlerErr::from(StoreError::LockUnavailable {
            waited: std::time::Duration::from_millis(5),
        });
        let resp = e.response("r1");
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("lock_unavailable"));
        assert_eq!(resp["error"]["details"]["retryable"], json!(true));
    }

    #[test]
    fn encode_failures_become_error_responses() {
        // JSON object keys must be strings.
        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![1u8], "x");
        let e = HandlerErr::from(serde_json::to_value(bad).expect_err("non-string key"));
        let resp = e.response("r2");
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("encode_failed"));
        assert!(resp.get("result").is_none());
    }
}
