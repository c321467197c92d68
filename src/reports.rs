use rusqlite::Connection;

use crate::dimensions::{find_by_name, DimensionKind};
use crate::error::{CenterBooksError, Result};

fn center_filter(conn: &Connection, center: Option<&str>) -> Result<Option<i64>> {
    match center {
        Some(name) => find_by_name(conn, DimensionKind::Center, name.trim())?
            .map(|c| Some(c.id))
            .ok_or_else(|| CenterBooksError::UnknownCenter(name.to_string())),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Monthly P&L
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthRow {
    pub month: u32,
    pub revenue: f64,
    pub expense: f64,
    pub profit: f64,
    pub classes: i64,
    pub students: i64,
}

#[derive(Debug, Clone)]
pub struct MonthlyPnl {
    pub year: i32,
    pub center: Option<String>,
    /// Always twelve entries, January first.
    pub months: Vec<MonthRow>,
    pub total_revenue: f64,
    pub total_expense: f64,
    pub profit: f64,
}

pub fn monthly_pnl(conn: &Connection, year: i32, center: Option<&str>) -> Result<MonthlyPnl> {
    let center_id = center_filter(conn, center)?;
    let mut months: Vec<MonthRow> = (1..=12)
        .map(|month| MonthRow { month, ..Default::default() })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT month, SUM(revenue), SUM(number_of_classes), SUM(number_of_students) \
         FROM income_records WHERE year = ?1 AND (?2 IS NULL OR center_id = ?2) GROUP BY month",
    )?;
    let income: Vec<(u32, f64, i64, i64)> = stmt
        .query_map(rusqlite::params![year, center_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (month, revenue, classes, students) in income {
        let m = &mut months[(month - 1) as usize];
        m.revenue = revenue;
        m.classes = classes;
        m.students = students;
    }

    let mut stmt = conn.prepare(
        "SELECT month, SUM(total) FROM expense_records \
         WHERE year = ?1 AND (?2 IS NULL OR center_id = ?2) GROUP BY month",
    )?;
    let expense: Vec<(u32, f64)> = stmt
        .query_map(rusqlite::params![year, center_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for (month, total) in expense {
        months[(month - 1) as usize].expense = total;
    }

    for m in &mut months {
        m.profit = m.revenue - m.expense;
    }
    let total_revenue: f64 = months.iter().map(|m| m.revenue).sum();
    let total_expense: f64 = months.iter().map(|m| m.expense).sum();

    Ok(MonthlyPnl {
        year,
        center: center.map(|c| c.trim().to_string()),
        months,
        total_revenue,
        total_expense,
        profit: total_revenue - total_expense,
    })
}

// ---------------------------------------------------------------------------
// Per-center summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CenterSummary {
    pub name: String,
    pub revenue: f64,
    pub expense: f64,
    pub profit: f64,
    pub classes: i64,
    pub students: i64,
}

/// Centers with any activity in `year`, most profitable first.
pub fn center_summary(conn: &Connection, year: i32) -> Result<Vec<CenterSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, COALESCE(i.revenue, 0), COALESCE(e.expense, 0), \
                COALESCE(i.classes, 0), COALESCE(i.students, 0) \
         FROM centers c \
         LEFT JOIN (SELECT center_id, SUM(revenue) AS revenue, SUM(number_of_classes) AS classes, \
                           SUM(number_of_students) AS students \
                    FROM income_records WHERE year = ?1 GROUP BY center_id) i ON i.center_id = c.id \
         LEFT JOIN (SELECT center_id, SUM(total) AS expense \
                    FROM expense_records WHERE year = ?1 GROUP BY center_id) e ON e.center_id = c.id \
         WHERE i.center_id IS NOT NULL OR e.center_id IS NOT NULL",
    )?;
    let mut rows: Vec<CenterSummary> = stmt
        .query_map([year], |row| {
            let revenue: f64 = row.get(1)?;
            let expense: f64 = row.get(2)?;
            Ok(CenterSummary {
                name: row.get(0)?,
                revenue,
                expense,
                profit: revenue - expense,
                classes: row.get(3)?,
                students: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.sort_by(|a, b| b.profit.total_cmp(&a.profit).then_with(|| a.name.cmp(&b.name)));
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Expense breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: i64,
    pub pct: f64,
}

pub fn expense_breakdown(conn: &Connection, year: i32, center: Option<&str>) -> Result<Vec<CategoryTotal>> {
    let center_id = center_filter(conn, center)?;
    let mut stmt = conn.prepare(
        "SELECT category, SUM(total) AS total, COUNT(*) FROM expense_records \
         WHERE year = ?1 AND (?2 IS NULL OR center_id = ?2) \
         GROUP BY category ORDER BY total DESC, category",
    )?;
    let raw: Vec<(String, f64, i64)> = stmt
        .query_map(rusqlite::params![year, center_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let grand: f64 = raw.iter().map(|(_, t, _)| t).sum();
    Ok(raw
        .into_iter()
        .map(|(category, total, count)| CategoryTotal {
            category,
            total,
            count,
            pct: if grand != 0.0 { total / grand * 100.0 } else { 0.0 },
        })
        .collect())
}
