use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::dimensions::{find_or_create, DimensionKind};
use crate::error::Result;
use crate::mapper::{
    expense_keys, income_keys, map_expense_row, map_income_row, EXPENSE_SHEET, INCOME_SHEET,
};
use crate::models::{ImportRecord, NewExpenseRecord, NewIncomeRecord};
use crate::workbook::{Row, Workbook};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What happened to one spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Imported,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Income,
    Expense,
}

impl SheetKind {
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Income => INCOME_SHEET,
            Self::Expense => EXPENSE_SHEET,
        }
    }
}

/// Summary of one import call. Row failures land in `errors`; they never make
/// the call itself fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub income_imported: usize,
    pub expense_imported: usize,
    pub errors: Vec<String>,
}

impl ImportResult {
    /// Fold one row outcome in. `row_no` is the 1-based data row (header
    /// excluded); `line` is where that row sits on the sheet.
    pub fn record(&mut self, sheet: SheetKind, row_no: usize, line: usize, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Imported => match sheet {
                SheetKind::Income => self.income_imported += 1,
                SheetKind::Expense => self.expense_imported += 1,
            },
            RowOutcome::Skipped => {}
            RowOutcome::Failed(reason) => self.errors.push(format!(
                "{} row {row_no} (sheet line {line}): {reason}",
                sheet.sheet_name()
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Accounting year for rows without their own `Năm` cell.
    pub year: i32,
    pub filename: Option<String>,
}

impl ImportOptions {
    pub fn new(year: i32) -> Self {
        Self { year, filename: None }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

pub fn insert_income(conn: &Connection, rec: &NewIncomeRecord, import_id: Option<i64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO income_records (month, year, center_id, program_id, number_of_classes, \
         number_of_students, revenue, import_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            rec.month,
            rec.year,
            rec.center_id,
            rec.program_id,
            rec.number_of_classes,
            rec.number_of_students,
            rec.revenue,
            import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_expense(conn: &Connection, rec: &NewExpenseRecord, import_id: Option<i64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO expense_records (month, year, center_id, category, item, position, \
         contract_type, hours, unit_price, kilometers, travel_allowance, responsible, status, \
         notes, amount, total, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        rusqlite::params![
            rec.month,
            rec.year,
            rec.center_id,
            rec.category,
            rec.item,
            rec.position,
            rec.contract_type,
            rec.hours,
            rec.unit_price,
            rec.kilometers,
            rec.travel_allowance,
            rec.responsible,
            rec.status,
            rec.notes,
            rec.amount,
            rec.total,
            import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------------------------------------------------------------------------
// Per-row pipeline
// ---------------------------------------------------------------------------

fn persist_income_row(conn: &Connection, row: &Row, center: &str, program: &str, year: i32, import_id: i64) -> Result<i64> {
    let center = find_or_create(conn, DimensionKind::Center, center)?;
    let program = find_or_create(conn, DimensionKind::Program, program)?;
    let rec = map_income_row(row, center.id, program.id, year);
    insert_income(conn, &rec, Some(import_id))
}

fn persist_expense_row(conn: &Connection, row: &Row, center: &str, year: i32, import_id: i64) -> Result<i64> {
    let center = find_or_create(conn, DimensionKind::Center, center)?;
    let rec = map_expense_row(row, center.id, year)?;
    insert_expense(conn, &rec, Some(import_id))
}

fn import_row(conn: &Connection, sheet: SheetKind, row: &Row, year: i32, import_id: i64) -> RowOutcome {
    let persisted = match sheet {
        SheetKind::Income => {
            let Some(keys) = income_keys(row) else {
                return RowOutcome::Skipped;
            };
            persist_income_row(conn, row, &keys.center, &keys.program, year, import_id)
        }
        SheetKind::Expense => {
            let Some(keys) = expense_keys(row) else {
                return RowOutcome::Skipped;
            };
            persist_expense_row(conn, row, &keys.center, year, import_id)
        }
    };
    match persisted {
        Ok(_) => RowOutcome::Imported,
        Err(e) => RowOutcome::Failed(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Import history
// ---------------------------------------------------------------------------

pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn begin_import(conn: &Connection, filename: &str, checksum: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO imports (filename, checksum) VALUES (?1, ?2)",
        rusqlite::params![filename, checksum],
    )?;
    Ok(conn.last_insert_rowid())
}

fn finish_import(conn: &Connection, import_id: i64, result: &ImportResult) -> Result<()> {
    conn.execute(
        "UPDATE imports SET income_imported = ?1, expense_imported = ?2, error_count = ?3 WHERE id = ?4",
        rusqlite::params![
            result.income_imported as i64,
            result.expense_imported as i64,
            result.errors.len() as i64,
            import_id,
        ],
    )?;
    Ok(())
}

pub fn list_imports(conn: &Connection) -> Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, checksum, income_imported, expense_imported, error_count, import_date \
         FROM imports ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ImportRecord {
                id: row.get(0)?,
                filename: row.get(1)?,
                checksum: row.get(2)?,
                income_imported: row.get(3)?,
                expense_imported: row.get(4)?,
                error_count: row.get(5)?,
                import_date: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// import_workbook
// ---------------------------------------------------------------------------

/// Import the income and expense sheets of a workbook blob.
///
/// Only an unreadable workbook (or an unreachable database) fails the call.
/// Rows are handled one at a time, each committed on its own; a bad row adds
/// one entry to `errors` and the loop moves on. Rows missing an identifying
/// column are skipped without comment.
pub fn import_workbook(conn: &Connection, bytes: &[u8], opts: &ImportOptions) -> Result<ImportResult> {
    let workbook = Workbook::open(bytes, &[INCOME_SHEET, EXPENSE_SHEET])?;
    let filename = opts.filename.as_deref().unwrap_or("(upload)");
    let import_id = begin_import(conn, filename, &compute_checksum(bytes))?;

    let mut result = ImportResult::default();
    for sheet in [SheetKind::Income, SheetKind::Expense] {
        let Some(data) = workbook.sheet(sheet.sheet_name()) else {
            debug!(sheet = sheet.sheet_name(), "sheet not present");
            continue;
        };
        let rows = data.rows();
        info!(sheet = sheet.sheet_name(), rows = rows.len(), "importing sheet");
        for (idx, row) in rows.iter().enumerate() {
            let outcome = import_row(conn, sheet, row, opts.year, import_id);
            match &outcome {
                RowOutcome::Skipped => debug!(sheet = sheet.sheet_name(), row = idx + 1, "row skipped"),
                RowOutcome::Failed(reason) => {
                    warn!(sheet = sheet.sheet_name(), row = idx + 1, %reason, "row failed")
                }
                RowOutcome::Imported => {}
            }
            result.record(sheet, idx + 1, data.line_of(idx), outcome);
        }
    }

    finish_import(conn, import_id, &result)?;
    info!(
        file = filename,
        income = result.income_imported,
        expense = result.expense_imported,
        errors = result.errors.len(),
        "import finished"
    );
    Ok(result)
}

pub fn import_file(conn: &Connection, file_path: &Path, opts: &ImportOptions) -> Result<ImportResult> {
    let bytes = std::fs::read(file_path)?;
    let opts = ImportOptions {
        filename: opts.filename.clone().or_else(|| {
            file_path.file_name().and_then(|n| n.to_str()).map(str::to_string)
        }),
        ..opts.clone()
    };
    import_workbook(conn, &bytes, &opts)
}
