use comfy_table::{Cell, Table};

use crate::dimensions::{list, DimensionKind};
use crate::error::Result;

use super::open_db;

pub fn run(kind: DimensionKind) -> Result<()> {
    let conn = open_db()?;
    let rows = list(&conn, kind)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Code"]);
    for d in rows {
        table.add_row(vec![
            Cell::new(d.id),
            Cell::new(d.name),
            Cell::new(d.code.unwrap_or_default()),
        ]);
    }
    let title = match kind {
        DimensionKind::Center => "Centers",
        DimensionKind::Program => "Programs",
    };
    println!("{title}\n{table}");
    Ok(())
}
