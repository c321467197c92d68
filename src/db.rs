use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "centerbooks.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS centers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255),
    code TEXT UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK (length(name) BETWEEN 1 AND 255),
    code TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    income_imported INTEGER NOT NULL DEFAULT 0,
    expense_imported INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    import_date TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS income_records (
    id INTEGER PRIMARY KEY,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    year INTEGER NOT NULL,
    center_id INTEGER NOT NULL,
    program_id INTEGER NOT NULL,
    number_of_classes INTEGER NOT NULL DEFAULT 0 CHECK (number_of_classes >= 0),
    number_of_students INTEGER NOT NULL DEFAULT 0 CHECK (number_of_students >= 0),
    revenue REAL NOT NULL DEFAULT 0,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (center_id) REFERENCES centers(id),
    FOREIGN KEY (program_id) REFERENCES programs(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS expense_records (
    id INTEGER PRIMARY KEY,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    year INTEGER NOT NULL,
    center_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    item TEXT NOT NULL,
    position TEXT,
    contract_type TEXT,
    hours REAL,
    unit_price REAL,
    kilometers REAL,
    travel_allowance REAL,
    responsible TEXT,
    status TEXT,
    notes TEXT,
    amount REAL NOT NULL,
    total REAL NOT NULL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (center_id) REFERENCES centers(id),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_income_period ON income_records (year, month);
CREATE INDEX IF NOT EXISTS idx_expense_period ON expense_records (year, month);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn count(conn: &Connection, table: &str) -> Result<i64> {
    let n = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n)
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join(DB_FILE)).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}
