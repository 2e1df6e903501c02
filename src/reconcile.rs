//! Upsert of one day's attendance batch into the attendance table.
//!
//! The table is read once per batch. Every submission is matched against
//! that snapshot only, never against rows written earlier in the same batch:
//! a batch naming the same new `(date, studentId)` twice appends two rows.
//! There is no rollback. A failed write leaves earlier writes of the batch in
//! place and the whole batch reports failure.
//!
//! The in-process [`AccessGate`] orders submits within one daemon. The store's
//! write section orders them across daemons sharing the workspace file, and is
//! committed whether or not the batch succeeded.

use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::gate::AccessGate;
use crate::model::{AttendanceKey, AttendanceRecord, Submission};
use crate::table::{Table, TableStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
}

/// Applies `submissions` for `date`, stamping every touched row with `timestamp`.
///
/// Must only run while the caller holds the [`AccessGate`].
pub fn apply<S: TableStore + ?Sized>(
    store: &S,
    date: &str,
    submissions: &[Submission],
    timestamp: &str,
) -> Result<ReconcileReport, StoreError> {
    let snapshot: Vec<AttendanceKey> = store
        .read_all(Table::Attendance)?
        .iter()
        .map(AttendanceKey::from_row)
        .collect();

    let mut report = ReconcileReport::default();
    for submission in submissions {
        let existing = snapshot
            .iter()
            .position(|key| key.matches(date, &submission.student_id));
        match existing {
            Some(row_index) => {
                store.update_cell(
                    Table::Attendance,
                    row_index,
                    "status",
                    submission.status.as_str(),
                )?;
                store.update_cell(Table::Attendance, row_index, "timestamp", timestamp)?;
                report.updated += 1;
            }
            None => {
                let record = AttendanceRecord {
                    id: Uuid::new_v4().to_string(),
                    student_id: submission.student_id.clone(),
                    date: date.to_string(),
                    status: submission.status,
                    timestamp: timestamp.to_string(),
                };
                store.append_row(Table::Attendance, &record.to_row())?;
                report.inserted += 1;
            }
        }
    }
    Ok(report)
}

/// Gate-protected entry point: acquire, open the write section, reconcile, commit, release.
pub fn submit_attendance<S: TableStore + ?Sized>(
    gate: &AccessGate,
    timeout: Duration,
    store: &S,
    date: &str,
    submissions: &[Submission],
) -> Result<ReconcileReport, StoreError> {
    let wait_started = Instant::now();
    let _guard = match gate.acquire(timeout) {
        Ok(guard) => guard,
        Err(e) => {
            warn!(date, records = submissions.len(), error = %e, "attendance submit refused");
            return Err(e);
        }
    };
    if let Err(e) = store.begin_write() {
        let e = if e.is_busy() {
            StoreError::LockUnavailable {
                waited: wait_started.elapsed(),
            }
        } else {
            e
        };
        warn!(date, records = submissions.len(), error = %e, "attendance store busy");
        return Err(e);
    }
    debug!(
        date,
        waited_ms = wait_started.elapsed().as_millis() as u64,
        "attendance gate acquired"
    );

    let timestamp = batch_timestamp();
    let applied = apply(store, date, submissions, &timestamp);
    let committed = store.end_write();
    let result = match (applied, committed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(commit)) => {
            error!(date, error = %commit, "attendance partial batch not committed");
            Err(e)
        }
    };
    match &result {
        Ok(report) => info!(
            date,
            inserted = report.inserted,
            updated = report.updated,
            "attendance batch reconciled"
        ),
        Err(e) => error!(
            date,
            records = submissions.len(),
            error = %e,
            "attendance batch failed; rows written before the failure are kept"
        ),
    }
    result
}

/// ISO-8601 UTC instant with millisecond precision, e.g. `2024-05-01T08:30:00.000Z`.
pub fn batch_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
