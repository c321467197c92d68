//! Pure row → record transformations for the two import sheets.

use crate::error::{CenterBooksError, Result};
use crate::models::{NewExpenseRecord, NewIncomeRecord};
use crate::month::normalize_month;
use crate::workbook::{Cell, Row};

pub const INCOME_SHEET: &str = "Doanh thu";
pub const EXPENSE_SHEET: &str = "Chi phí";

/// Column headers, matched exactly after trimming.
pub mod col {
    pub const MONTH: &str = "Tháng";
    pub const YEAR: &str = "Năm";
    pub const CENTER: &str = "Trung tâm";

    pub const PROGRAM: &str = "Chương trình";
    pub const CLASSES: &str = "Số lớp";
    pub const STUDENTS: &str = "Số học viên";
    pub const REVENUE: &str = "Doanh thu";

    pub const CATEGORY: &str = "Khoản chi";
    pub const ITEM: &str = "Hạng mục";
    pub const POSITION: &str = "Vị trí";
    pub const CONTRACT_TYPE: &str = "Loại hợp đồng";
    pub const HOURS: &str = "Số giờ";
    pub const UNIT_PRICE: &str = "Đơn giá";
    pub const KILOMETERS: &str = "Số km";
    pub const TRAVEL_ALLOWANCE: &str = "Phụ cấp đi lại";
    pub const AMOUNT: &str = "Thành tiền";
    pub const TOTAL: &str = "Tổng cộng";
    pub const RESPONSIBLE: &str = "Người phụ trách";
    pub const STATUS: &str = "Trạng thái";
    pub const NOTES: &str = "Ghi chú";
}

pub const INCOME_HEADERS: &[&str] = &[
    col::MONTH,
    col::YEAR,
    col::CENTER,
    col::PROGRAM,
    col::CLASSES,
    col::STUDENTS,
    col::REVENUE,
];

pub const EXPENSE_HEADERS: &[&str] = &[
    col::MONTH,
    col::YEAR,
    col::CENTER,
    col::CATEGORY,
    col::ITEM,
    col::POSITION,
    col::CONTRACT_TYPE,
    col::HOURS,
    col::UNIT_PRICE,
    col::KILOMETERS,
    col::TRAVEL_ALLOWANCE,
    col::AMOUNT,
    col::TOTAL,
    col::RESPONSIBLE,
    col::STATUS,
    col::NOTES,
];

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Natural keys an income row must carry to be imported at all.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeKeys {
    pub center: String,
    pub program: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseKeys {
    pub center: String,
    pub category: String,
    pub item: String,
}

pub fn income_keys(row: &Row) -> Option<IncomeKeys> {
    if !row.has(col::MONTH) {
        return None;
    }
    Some(IncomeKeys {
        center: row.text(col::CENTER)?,
        program: row.text(col::PROGRAM)?,
    })
}

pub fn expense_keys(row: &Row) -> Option<ExpenseKeys> {
    if !row.has(col::MONTH) {
        return None;
    }
    Some(ExpenseKeys {
        center: row.text(col::CENTER)?,
        category: row.text(col::CATEGORY)?,
        item: row.text(col::ITEM)?,
    })
}

// ---------------------------------------------------------------------------
// Mappers
// ---------------------------------------------------------------------------

/// Accounting year: the row's own `Năm` cell when it holds a plausible year,
/// otherwise the batch year.
pub fn row_year(row: &Row, batch_year: i32) -> i32 {
    let y = row.get(col::YEAR).parse_int_or(0);
    if (1900..=9999).contains(&y) {
        y as i32
    } else {
        batch_year
    }
}

pub fn map_income_row(row: &Row, center_id: i64, program_id: i64, batch_year: i32) -> NewIncomeRecord {
    NewIncomeRecord {
        month: normalize_month(row.get(col::MONTH)),
        year: row_year(row, batch_year),
        center_id,
        program_id,
        number_of_classes: row.get(col::CLASSES).parse_int_or(0),
        number_of_students: row.get(col::STUDENTS).parse_int_or(0),
        revenue: row.get(col::REVENUE).parse_float_or(0.0),
    }
}

/// Required money column: blank means zero, but text that is not a number is
/// a mapping error rather than a silent zero.
fn required_money(row: &Row, header: &str) -> Result<Option<f64>> {
    match row.get(header) {
        Cell::Absent => Ok(None),
        cell => cell.parse_float_opt().map(Some).ok_or_else(|| {
            CenterBooksError::Other(format!(
                "'{header}' is not a number: {}",
                cell.as_text().unwrap_or_default()
            ))
        }),
    }
}

pub fn map_expense_row(row: &Row, center_id: i64, batch_year: i32) -> Result<NewExpenseRecord> {
    let keys = expense_keys(row)
        .ok_or_else(|| CenterBooksError::Other("expense row is missing a required column".into()))?;

    let travel_allowance = row.get(col::TRAVEL_ALLOWANCE).parse_float_opt();
    let amount = required_money(row, col::AMOUNT)?.unwrap_or(0.0);
    let total = match required_money(row, col::TOTAL)? {
        Some(t) => t,
        None => amount + travel_allowance.unwrap_or(0.0),
    };

    Ok(NewExpenseRecord {
        month: normalize_month(row.get(col::MONTH)),
        year: row_year(row, batch_year),
        center_id,
        category: keys.category,
        item: keys.item,
        position: row.text(col::POSITION),
        contract_type: row.text(col::CONTRACT_TYPE),
        hours: row.get(col::HOURS).parse_float_opt(),
        unit_price: row.get(col::UNIT_PRICE).parse_float_opt(),
        kilometers: row.get(col::KILOMETERS).parse_float_opt(),
        travel_allowance,
        responsible: row.text(col::RESPONSIBLE),
        status: row.text(col::STATUS),
        notes: row.text(col::NOTES),
        amount,
        total,
    })
}
