use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::table::{SqliteTableStore, Table};

pub const DB_FILE_NAME: &str = "rollcall.sqlite3";

pub fn open_db(workspace: &Path, busy_timeout: Duration) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    // Several daemons may share one workspace file; wait out their write locks.
    conn.busy_timeout(busy_timeout)?;

    let store = SqliteTableStore::new(&conn);
    for table in Table::ALL {
        store.ensure_table(table)?;
    }

    Ok(conn)
}

/// Column names of `table` in declaration order; empty when the table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get::<_, String>(1)?);
    }
    Ok(out)
}
