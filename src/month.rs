use chrono::{DateTime, Datelike};

use crate::workbook::Cell;

/// Days between the spreadsheet epoch (serial 0 = 1899-12-30) and 1970-01-01.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Month (1-12) of a spreadsheet date serial.
pub fn serial_to_month(serial: f64) -> Option<u32> {
    let secs = (serial - UNIX_EPOCH_SERIAL) * SECONDS_PER_DAY;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.floor() as i64, 0).map(|dt| dt.month())
}

fn clamp_month(m: i64) -> u32 {
    m.clamp(1, 12) as u32
}

/// Reduce a raw "month" cell to 1-12.
///
/// Source sheets mix hand-typed month numbers with cells Excel turned into
/// full date serials, so numbers above 12 are read as serials. Everything
/// else is clamped, and unreadable input becomes January.
pub fn normalize_month(cell: &Cell) -> u32 {
    match cell {
        Cell::Number(n) if n.is_nan() => 1,
        Cell::Number(n) if *n > 12.0 => serial_to_month(*n).unwrap_or(12),
        Cell::Number(n) => clamp_month(n.trunc() as i64),
        Cell::Text(_) => clamp_month(cell.parse_int_or(1)),
        Cell::Absent => 1,
    }
}
