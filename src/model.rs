//! Structured records and their mapping to and from header-keyed rows.
//!
//! `grade` and `classNum` are kept as the exact cell text. They look numeric
//! but are matched as strings, so `"03"` and `"3"` are different groups.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;
use crate::table::{Row, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    EarlyLeave,
    Other,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::EarlyLeave,
        AttendanceStatus::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::EarlyLeave => "early-leave",
            AttendanceStatus::Other => "other",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown attendance status {:?}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub grade: String,
    pub class_num: String,
    pub number: String,
    pub gender: String,
    pub birth_date: String,
}

impl Student {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: cell(row, "id"),
            name: cell(row, "name"),
            grade: cell(row, "grade"),
            class_num: cell(row, "classNum"),
            number: cell(row, "number"),
            gender: cell(row, "gender"),
            birth_date: cell(row, "birthDate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub timestamp: String,
}

impl AttendanceRecord {
    pub fn from_row(row_index: usize, row: &Row) -> Result<Self, StoreError> {
        let status = cell(row, "status")
            .parse::<AttendanceStatus>()
            .map_err(|reason| StoreError::MalformedRow {
                table: Table::Attendance.name(),
                row_index,
                reason,
            })?;
        Ok(Self {
            id: cell(row, "id"),
            student_id: cell(row, "studentId"),
            date: cell(row, "date"),
            status,
            timestamp: cell(row, "timestamp"),
        })
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), self.id.clone());
        row.insert("studentId".to_string(), self.student_id.clone());
        row.insert("date".to_string(), self.date.clone());
        row.insert("status".to_string(), self.status.as_str().to_string());
        row.insert("timestamp".to_string(), self.timestamp.clone());
        row
    }
}

/// The `(date, studentId)` pair that identifies at most one attendance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceKey {
    pub date: String,
    pub student_id: String,
}

impl AttendanceKey {
    /// Keys only need the two identifying cells, so rows with odd statuses still match.
    pub fn from_row(row: &Row) -> Self {
        Self {
            date: cell(row, "date"),
            student_id: cell(row, "studentId"),
        }
    }

    pub fn matches(&self, date: &str, student_id: &str) -> bool {
        self.date == date && self.student_id == student_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(deserialize_with = "string_or_number")]
    pub student_id: String,
    pub status: AttendanceStatus,
}

/// Ids arrive as strings or numbers; numbers are kept in their JSON text form.
fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_wire_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_value(AttendanceStatus::EarlyLeave).expect("ser"),
            json!("early-leave")
        );
        let parsed: AttendanceStatus = serde_json::from_value(json!("late")).expect("de");
        assert_eq!(parsed, AttendanceStatus::Late);
        assert!("Present".parse::<AttendanceStatus>().is_err());
        for status in AttendanceStatus::ALL {
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }
    }

    #[test]
    fn record_row_with_unknown_status_is_malformed() {
        let mut row = Row::new();
        row.insert("id".into(), "a1".into());
        row.insert("status".into(), "sick".into());
        let err = AttendanceRecord::from_row(3, &row).expect_err("bad status");
        assert!(matches!(
            err,
            StoreError::MalformedRow {
                table: "attendance",
                row_index: 3,
                ..
            }
        ));
        assert!(AttendanceKey::from_row(&row).matches("", ""));
    }

    #[test]
    fn student_serializes_with_camel_case_keys() {
        let mut row = Row::new();
        row.insert("id".into(), "s1".into());
        row.insert("classNum".into(), "2".into());
        row.insert("birthDate".into(), "2015-01-02".into());
        let v = serde_json::to_value(Student::from_row(&row)).expect("ser");
        assert_eq!(v["classNum"], json!("2"));
        assert_eq!(v["birthDate"], json!("2015-01-02"));
        assert_eq!(v["gender"], json!(""));
    }

    #[test]
    fn submission_deserializes_from_client_shape() {
        let s: Submission =
            serde_json::from_value(json!({ "studentId": "s9", "status": "absent" })).expect("de");
        assert_eq!(s.student_id, "s9");
        assert_eq!(s.status, AttendanceStatus::Absent);
    }

    #[test]
    fn numeric_student_id_is_stringified() {
        let s: Submission =
            serde_json::from_value(json!({ "studentId": 7, "status": "late" })).expect("de");
        assert_eq!(s.student_id, "7");

        let nested = serde_json::from_value::<Submission>(
            json!({ "studentId": { "id": 7 }, "status": "late" }),
        );
        assert!(nested.is_err());
        let missing = serde_json::from_value::<Submission>(json!({ "status": "late" }));
        assert!(missing.is_err());
    }
}
