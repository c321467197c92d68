use std::path::Path;

use rusqlite::Connection;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::mapper::{EXPENSE_HEADERS, EXPENSE_SHEET, INCOME_HEADERS, INCOME_SHEET};

/// A value headed for one spreadsheet cell; `None` leaves the cell blank.
enum Out {
    Num(Option<f64>),
    Text(Option<String>),
}

fn write_header(ws: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, h) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *h, &bold)?;
        ws.set_column_width(col as u16, 16)?;
    }
    Ok(())
}

fn write_row(ws: &mut Worksheet, row: u32, values: Vec<Out>) -> Result<()> {
    for (col, value) in values.into_iter().enumerate() {
        let col = col as u16;
        match value {
            Out::Num(Some(n)) => {
                ws.write_number(row, col, n)?;
            }
            Out::Text(Some(s)) => {
                ws.write_string(row, col, s)?;
            }
            Out::Num(None) | Out::Text(None) => {}
        }
    }
    Ok(())
}

fn year_clause(year: Option<i32>) -> &'static str {
    if year.is_some() {
        "WHERE r.year = ?1"
    } else {
        "WHERE ?1 IS NULL"
    }
}

fn write_income(conn: &Connection, ws: &mut Worksheet, year: Option<i32>) -> Result<usize> {
    write_header(ws, INCOME_HEADERS)?;
    let sql = format!(
        "SELECT r.month, r.year, c.name, p.name, r.number_of_classes, r.number_of_students, r.revenue \
         FROM income_records r JOIN centers c ON r.center_id = c.id JOIN programs p ON r.program_id = p.id \
         {} ORDER BY r.year, r.month, c.name, p.name, r.id",
        year_clause(year)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<Vec<Out>> = stmt
        .query_map([year], |row| {
            Ok(vec![
                Out::Num(Some(row.get::<_, i64>(0)? as f64)),
                Out::Num(Some(row.get::<_, i64>(1)? as f64)),
                Out::Text(Some(row.get(2)?)),
                Out::Text(Some(row.get(3)?)),
                Out::Num(Some(row.get::<_, i64>(4)? as f64)),
                Out::Num(Some(row.get::<_, i64>(5)? as f64)),
                Out::Num(Some(row.get(6)?)),
            ])
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let written = rows.len();
    for (i, values) in rows.into_iter().enumerate() {
        write_row(ws, i as u32 + 1, values)?;
    }
    Ok(written)
}

fn write_expense(conn: &Connection, ws: &mut Worksheet, year: Option<i32>) -> Result<usize> {
    write_header(ws, EXPENSE_HEADERS)?;
    let sql = format!(
        "SELECT r.month, r.year, c.name, r.category, r.item, r.position, r.contract_type, r.hours, \
                r.unit_price, r.kilometers, r.travel_allowance, r.amount, r.total, r.responsible, \
                r.status, r.notes \
         FROM expense_records r JOIN centers c ON r.center_id = c.id \
         {} ORDER BY r.year, r.month, c.name, r.id",
        year_clause(year)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<Vec<Out>> = stmt
        .query_map([year], |row| {
            Ok(vec![
                Out::Num(Some(row.get::<_, i64>(0)? as f64)),
                Out::Num(Some(row.get::<_, i64>(1)? as f64)),
                Out::Text(Some(row.get(2)?)),
                Out::Text(Some(row.get(3)?)),
                Out::Text(Some(row.get(4)?)),
                Out::Text(row.get(5)?),
                Out::Text(row.get(6)?),
                Out::Num(row.get(7)?),
                Out::Num(row.get(8)?),
                Out::Num(row.get(9)?),
                Out::Num(row.get(10)?),
                Out::Num(Some(row.get(11)?)),
                Out::Num(Some(row.get(12)?)),
                Out::Text(row.get(13)?),
                Out::Text(row.get(14)?),
                Out::Text(row.get(15)?),
            ])
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let written = rows.len();
    for (i, values) in rows.into_iter().enumerate() {
        write_row(ws, i as u32 + 1, values)?;
    }
    Ok(written)
}

pub struct ExportSummary {
    pub income_rows: usize,
    pub expense_rows: usize,
}

/// Render income and expense records as an xlsx blob laid out exactly like an
/// import file. With no records this is a blank template.
pub fn export_workbook(conn: &Connection, year: Option<i32>) -> Result<(Vec<u8>, ExportSummary)> {
    let mut workbook = Workbook::new();

    let income_ws = workbook.add_worksheet();
    income_ws.set_name(INCOME_SHEET)?;
    let income_rows = write_income(conn, income_ws, year)?;

    let expense_ws = workbook.add_worksheet();
    expense_ws.set_name(EXPENSE_SHEET)?;
    let expense_rows = write_expense(conn, expense_ws, year)?;

    let bytes = workbook.save_to_buffer()?;
    Ok((bytes, ExportSummary { income_rows, expense_rows }))
}

pub fn export_to_file(conn: &Connection, year: Option<i32>, path: &Path) -> Result<ExportSummary> {
    let (bytes, summary) = export_workbook(conn, year)?;
    std::fs::write(path, bytes)?;
    Ok(summary)
}
