//! Header-driven tabular storage.
//!
//! Every logical table is an ordered list of data rows under a fixed header.
//! Rows are addressed by their zero-based position among data rows, which is
//! insertion order. Nothing at this layer enforces key uniqueness or rolls
//! back a partly applied batch. A write section only keeps other connections
//! to the same file out while it is open.

use std::collections::BTreeMap;

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::db;
use crate::error::StoreError;

/// One data row keyed by header name. Cells are the text form of the stored value.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Students,
    Attendance,
}

pub const STUDENT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "grade",
    "classNum",
    "number",
    "gender",
    "birthDate",
];

pub const ATTENDANCE_COLUMNS: &[&str] = &["id", "studentId", "date", "status", "timestamp"];

impl Table {
    pub const ALL: [Table; 2] = [Table::Students, Table::Attendance];

    pub fn name(self) -> &'static str {
        match self {
            Table::Students => "students",
            Table::Attendance => "attendance",
        }
    }

    /// Header written when the table is first created.
    pub fn canonical_header(self) -> &'static [&'static str] {
        match self {
            Table::Students => STUDENT_COLUMNS,
            Table::Attendance => ATTENDANCE_COLUMNS,
        }
    }
}

pub trait TableStore {
    /// All data rows in order. Creates the table with its canonical header if absent.
    fn read_all(&self, table: Table) -> Result<Vec<Row>, StoreError>;

    /// Appends `row` after the last data row, positionally in header order.
    fn append_row(&self, table: Table, row: &Row) -> Result<(), StoreError>;

    /// Overwrites one cell of an existing data row.
    fn update_cell(
        &self,
        table: Table,
        row_index: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Opens a write section. Other connections to the same store wait until it ends.
    fn begin_write(&self) -> Result<(), StoreError>;

    /// Ends the section opened by `begin_write`, keeping every write made inside it.
    /// A no-op when no section is open.
    fn end_write(&self) -> Result<(), StoreError>;
}

/// SQLite rendition: one SQL table per logical table, columns = header, `rowid` = row order.
pub struct SqliteTableStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteTableStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn ensure_table(&self, table: Table) -> Result<(), StoreError> {
        let columns = table
            .canonical_header()
            .iter()
            .map(|c| format!("{} TEXT NOT NULL DEFAULT ''", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS {}({})", table.name(), columns),
            [],
        )?;
        Ok(())
    }

    fn header(&self, table: Table) -> Result<Vec<String>, StoreError> {
        self.ensure_table(table)?;
        Ok(db::table_columns(self.conn, table.name())?)
    }
}

impl TableStore for SqliteTableStore<'_> {
    fn read_all(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        let header = self.header(table)?;
        let select = header
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            select,
            table.name()
        ))?;
        let rows = stmt
            .query_map([], |r| {
                let mut row = Row::new();
                for (i, column) in header.iter().enumerate() {
                    row.insert(column.clone(), cell_text(r.get_ref(i)?));
                }
                Ok(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn append_row(&self, table: Table, row: &Row) -> Result<(), StoreError> {
        let header = self.header(table)?;
        let columns = header
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; header.len()].join(", ");
        let values: Vec<&str> = header
            .iter()
            .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
            .collect();
        self.conn.execute(
            &format!(
                "INSERT INTO {}({}) VALUES({})",
                table.name(),
                columns,
                placeholders
            ),
            params_from_iter(values),
        )?;
        Ok(())
    }

    fn update_cell(
        &self,
        table: Table,
        row_index: usize,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let header = self.header(table)?;
        if !header.iter().any(|c| c == column) {
            return Err(StoreError::UnknownColumn {
                table: table.name(),
                column: column.to_string(),
            });
        }

        let offset = i64::try_from(row_index).unwrap_or(i64::MAX);
        let rowid: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "SELECT rowid FROM {} ORDER BY rowid LIMIT 1 OFFSET ?",
                    table.name()
                ),
                [offset],
                |r| r.get(0),
            )
            .optional()?;
        let Some(rowid) = rowid else {
            let rows: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table.name()),
                [],
                |r| r.get(0),
            )?;
            return Err(StoreError::OutOfRange {
                table: table.name(),
                row_index,
                rows: rows.max(0) as usize,
            });
        };

        self.conn.execute(
            &format!(
                "UPDATE {} SET {} = ? WHERE rowid = ?",
                table.name(),
                quote_ident(column)
            ),
            (value, rowid),
        )?;
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        // IMMEDIATE takes the file's write lock up front, so a second daemon blocks
        // here (under its busy timeout) instead of reading a stale snapshot.
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn end_write(&self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            // Leave the connection usable for the next batch.
            if !self.conn.is_autocommit() {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_text(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
