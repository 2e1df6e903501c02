use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_required_key, require_db};
use crate::ipc::types::{AppState, Request};
use crate::query;
use crate::table::SqliteTableStore;

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let grade = get_required_key(params, "grade")?;
    let class_num = get_required_key(params, "classNum")?;
    let store = SqliteTableStore::new(conn);
    let students = query::students_by_grade_class(&store, &grade, &class_num)?;
    Ok(serde_json::to_value(students)?)
}

fn grade_class_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let store = SqliteTableStore::new(conn);
    let list = query::distinct_grades_and_classes(&store)?;
    Ok(serde_json::to_value(list)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.gradeClassList" => grade_class_list(state),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => error.response(&req.id),
    })
}
