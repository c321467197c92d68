use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::reports;
use crate::settings::load_settings;

use super::open_db;

fn profit_cell(v: f64) -> Cell {
    if v < 0.0 {
        Cell::new(money(v).red())
    } else {
        Cell::new(money(v))
    }
}

pub fn pnl(year: Option<i32>, center: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let year = load_settings().resolve_year(year);
    let data = reports::monthly_pnl(&conn, year, center.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Classes", "Students", "Revenue", "Expense", "Profit"]);
    for m in &data.months {
        table.add_row(vec![
            Cell::new(format!("{year}-{:02}", m.month)),
            Cell::new(m.classes),
            Cell::new(m.students),
            Cell::new(money(m.revenue)),
            Cell::new(money(m.expense)),
            profit_cell(m.profit),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(data.total_revenue)),
        Cell::new(money(data.total_expense)),
        profit_cell(data.profit),
    ]);

    let scope = data.center.as_deref().unwrap_or("all centers");
    println!("Profit & Loss {year} ({scope})\n{table}");
    Ok(())
}

pub fn centers(year: Option<i32>) -> Result<()> {
    let conn = open_db()?;
    let year = load_settings().resolve_year(year);
    let rows = reports::center_summary(&conn, year)?;

    let mut table = Table::new();
    table.set_header(vec!["Center", "Classes", "Students", "Revenue", "Expense", "Profit"]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(&r.name),
            Cell::new(r.classes),
            Cell::new(r.students),
            Cell::new(money(r.revenue)),
            Cell::new(money(r.expense)),
            profit_cell(r.profit),
        ]);
    }
    println!("Centers {year}\n{table}");
    Ok(())
}

pub fn expenses(year: Option<i32>, center: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let year = load_settings().resolve_year(year);
    let items = reports::expense_breakdown(&conn, year, center.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    let mut total = 0.0;
    for item in &items {
        total += item.total;
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(money(item.total)),
            Cell::new(format!("{:.1}%", item.pct)),
            Cell::new(item.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total)),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("Expense Breakdown {year}\n{table}");
    Ok(())
}
