use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_required_date, get_required_key, require_db};
use crate::ipc::types::{AppState, Request};
use crate::model::Submission;
use crate::query;
use crate::reconcile;
use crate::table::SqliteTableStore;
use serde_json::json;

fn parse_submissions(params: &serde_json::Value) -> Result<Vec<Submission>, HandlerErr> {
    let Some(raw) = params.get("records") else {
        return Err(HandlerErr::bad_params("missing records"));
    };
    if !raw.is_array() {
        return Err(HandlerErr::bad_params("records must be an array"));
    }
    serde_json::from_value::<Vec<Submission>>(raw.clone()).map_err(|e| HandlerErr {
        code: "bad_params",
        message: format!("invalid records: {}", e),
        details: None,
    })
}

fn attendance_get(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let date = get_required_date(params, "date")?;
    let grade = get_required_key(params, "grade")?;
    let class_num = get_required_key(params, "classNum")?;
    let store = SqliteTableStore::new(conn);
    let records = query::attendance_for_class_on_date(&store, &date, &grade, &class_num)?;
    Ok(serde_json::to_value(records)?)
}

fn attendance_submit(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let date = get_required_date(params, "date")?;
    // The whole batch is validated before the gate is requested.
    let submissions = parse_submissions(params)?;
    let store = SqliteTableStore::new(conn);
    reconcile::submit_attendance(
        &state.gate,
        state.lock_timeout,
        &store,
        &date,
        &submissions,
    )?;
    Ok(json!(true))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.get" => attendance_get(state, &req.params),
        "attendance.submit" => attendance_submit(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => error.response(&req.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AccessGate;
    use crate::model::AttendanceStatus;
    use crate::table::Table;
    use std::sync::Arc;
    use std::time::Duration;

    fn state_with_memory_db(lock_timeout: Duration) -> AppState {
        let mut state = AppState::new(
            Arc::new(AccessGate::new()),
            lock_timeout,
            Duration::from_millis(100),
        );
        let conn = rusqlite::Connection::open_in_memory().expect("memory db");
        for table in Table::ALL {
            SqliteTableStore::new(&conn)
                .ensure_table(table)
                .expect("create table");
        }
        state.db = Some(conn);
        state
    }

    fn call(state: &mut AppState, method: &str, params: serde_json::Value) -> serde_json::Value {
        let req = Request {
            id: "t".to_string(),
            method: method.to_string(),
            params,
        };
        try_handle(state, &req).expect("attendance method")
    }

    #[test]
    fn records_parse_in_submission_order() {
        let subs = parse_submissions(&json!({
            "records": [
                { "studentId": "s2", "status": "late" },
                { "studentId": "s1", "status": "other" }
            ]
        }))
        .expect("parse");
        assert_eq!(subs[0].student_id, "s2");
        assert_eq!(subs[1].status, AttendanceStatus::Other);
    }

    #[test]
    fn one_bad_status_rejects_the_whole_batch_before_writing() {
        let mut state = state_with_memory_db(Duration::from_millis(50));
        let resp = call(
            &mut state,
            "attendance.submit",
            json!({
                "date": "2024-05-01",
                "records": [
                    { "studentId": "s1", "status": "present" },
                    { "studentId": "s2", "status": "sick" }
                ]
            }),
        );
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("bad_params"));

        let conn = state.db.as_ref().expect("db");
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |r| r.get(0))
            .expect("count");
        assert_eq!(n, 0);
    }

    #[test]
    fn held_gate_reports_retryable_lock_unavailable() {
        let mut state = state_with_memory_db(Duration::from_millis(30));
        let gate = Arc::clone(&state.gate);
        let _held = gate.acquire(Duration::from_millis(10)).expect("free gate");

        let resp = call(
            &mut state,
            "attendance.submit",
            json!({
                "date": "2024-05-01",
                "records": [{ "studentId": "s1", "status": "present" }]
            }),
        );
        assert_eq!(resp["error"]["code"], json!("lock_unavailable"));
        assert_eq!(resp["error"]["details"]["retryable"], json!(true));
    }

    #[test]
    fn numeric_student_ids_are_stored_as_text() {
        let mut state = state_with_memory_db(Duration::from_millis(50));
        {
            let conn = state.db.as_ref().expect("db");
            conn.execute(
                "INSERT INTO students(id, name, grade, classNum) VALUES('7', 'Kim', '3', '2')",
                [],
            )
            .expect("seed student");
        }

        let resp = call(
            &mut state,
            "attendance.submit",
            json!({
                "date": "2024-05-01",
                "records": [{ "studentId": 7, "status": "late" }]
            }),
        );
        assert_eq!(resp["result"], json!(true), "{}", resp);

        let resp = call(
            &mut state,
            "attendance.get",
            json!({ "date": "2024-05-01", "grade": 3, "classNum": 2 }),
        );
        let rows = resp["result"].as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["studentId"], json!("7"));
        assert_eq!(rows[0]["status"], json!("late"));
    }

    #[test]
    fn missing_records_is_bad_params() {
        let mut state = state_with_memory_db(Duration::from_millis(50));
        let resp = call(&mut state, "attendance.submit", json!({ "date": "2024-05-01" }));
        assert_eq!(resp["error"]["code"], json!("bad_params"));
        assert_eq!(resp["error"]["message"], json!("missing records"));
    }

    #[test]
    fn no_workspace_is_reported_before_params() {
        let mut state = AppState::new(
            Arc::new(AccessGate::new()),
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        let resp = call(&mut state, "attendance.get", json!({}));
        assert_eq!(resp["error"]["code"], json!("no_workspace"));
    }
}
