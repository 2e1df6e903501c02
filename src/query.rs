use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::StoreError;
use crate::model::{AttendanceRecord, Student};
use crate::table::{Table, TableStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeClassList {
    pub grades: Vec<String>,
    pub classes: Vec<i64>,
}

/// Exact string match on both keys; `"03"` does not select grade `"3"`.
pub fn students_by_grade_class<S: TableStore + ?Sized>(
    store: &S,
    grade: &str,
    class_num: &str,
) -> Result<Vec<Student>, StoreError> {
    Ok(store
        .read_all(Table::Students)?
        .iter()
        .map(Student::from_row)
        .filter(|s| s.grade == grade && s.class_num == class_num)
        .collect())
}

pub fn attendance_for_class_on_date<S: TableStore + ?Sized>(
    store: &S,
    date: &str,
    grade: &str,
    class_num: &str,
) -> Result<Vec<AttendanceRecord>, StoreError> {
    let roster: HashSet<String> = students_by_grade_class(store, grade, class_num)?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let mut out = Vec::new();
    for (row_index, row) in store.read_all(Table::Attendance)?.iter().enumerate() {
        let on_date = row.get("date").is_some_and(|d| d == date);
        let in_class = row
            .get("studentId")
            .is_some_and(|id| roster.contains(id));
        if on_date && in_class {
            out.push(AttendanceRecord::from_row(row_index, row)?);
        }
    }
    Ok(out)
}

/// Grades sorted as text, classes sorted as numbers. Blank cells are skipped, and
/// class cells that are not integers are skipped since they have no numeric order.
pub fn distinct_grades_and_classes<S: TableStore + ?Sized>(
    store: &S,
) -> Result<GradeClassList, StoreError> {
    let mut grades = BTreeSet::new();
    let mut classes = BTreeSet::new();
    for student in store.read_all(Table::Students)?.iter().map(Student::from_row) {
        if !student.grade.is_empty() {
            grades.insert(student.grade);
        }
        if let Ok(n) = student.class_num.trim().parse::<i64>() {
            classes.insert(n);
        }
    }
    Ok(GradeClassList {
        grades: grades.into_iter().collect(),
        classes: classes.into_iter().collect(),
    })
}
