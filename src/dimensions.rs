use rusqlite::{Connection, ErrorCode, OptionalExtension};
use tracing::debug;

use crate::error::{CenterBooksError, Result};
use crate::models::Dimension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Center,
    Program,
}

impl DimensionKind {
    fn table(&self) -> &'static str {
        match self {
            Self::Center => "centers",
            Self::Program => "programs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Program => "program",
        }
    }
}

pub fn find_by_name(conn: &Connection, kind: DimensionKind, name: &str) -> Result<Option<Dimension>> {
    let sql = format!("SELECT id, name, code FROM {} WHERE name = ?1", kind.table());
    let found = conn
        .query_row(&sql, [name], |row| {
            Ok(Dimension {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
            })
        })
        .optional()?;
    Ok(found)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Return the center/program called `name`, creating it if needed.
///
/// Creation goes through the `UNIQUE(name)` constraint, so two imports racing
/// on the same new name end up with one row. A conflict on insert means the
/// other writer won, and the existing row is returned.
pub fn find_or_create(conn: &Connection, kind: DimensionKind, name: &str) -> Result<Dimension> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CenterBooksError::Other(format!("empty {} name", kind.label())));
    }

    let sql = format!(
        "INSERT INTO {} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        kind.table()
    );
    match conn.execute(&sql, [name]) {
        Ok(1) => debug!(kind = kind.label(), name, "created dimension"),
        Ok(_) => {}
        // Lost race on a uniqueness constraint that the upsert target does not cover.
        Err(e) if is_constraint_violation(&e) && find_by_name(conn, kind, name)?.is_some() => {}
        Err(e) => return Err(e.into()),
    }

    find_by_name(conn, kind, name)?.ok_or_else(|| {
        CenterBooksError::Other(format!("{} '{name}' vanished after insert", kind.label()))
    })
}

pub fn list(conn: &Connection, kind: DimensionKind) -> Result<Vec<Dimension>> {
    let sql = format!("SELECT id, name, code FROM {} ORDER BY name", kind.table());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Dimension {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
