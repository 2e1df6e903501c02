use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attendance gate not acquired within {}ms", .waited.as_millis())]
    LockUnavailable { waited: Duration },
    #[error("{table}: data row {row_index} out of range ({rows} rows)")]
    OutOfRange {
        table: &'static str,
        row_index: usize,
        rows: usize,
    },
    #[error("{table}: no column named {column:?}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("{table}: row {row_index} is malformed: {reason}")]
    MalformedRow {
        table: &'static str,
        row_index: usize,
        reason: String,
    },
    #[error(transparent)]
    Io(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::LockUnavailable { .. } => "lock_unavailable",
            StoreError::OutOfRange { .. } => "out_of_range",
            StoreError::UnknownColumn { .. } => "unknown_column",
            StoreError::MalformedRow { .. } => "malformed_row",
            StoreError::Io(_) => "store_io_failed",
        }
    }

    /// Only a lost race for the gate is worth retrying unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, StoreError::LockUnavailable { .. })
    }

    /// Another connection held the store file past the busy timeout.
    pub fn is_busy(&self) -> bool {
        match self {
            StoreError::Io(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
