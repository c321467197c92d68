use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::importer::list_imports;

use super::open_db;

pub fn run() -> Result<()> {
    let conn = open_db()?;
    let imports = list_imports(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "File", "Income", "Expense", "Errors", "Checksum"]);
    for imp in imports {
        table.add_row(vec![
            Cell::new(imp.id),
            Cell::new(imp.import_date),
            Cell::new(imp.filename),
            Cell::new(imp.income_imported),
            Cell::new(imp.expense_imported),
            Cell::new(imp.error_count),
            Cell::new(&imp.checksum[..imp.checksum.len().min(12)]),
        ]);
    }
    println!("Imports\n{table}");
    Ok(())
}
