use std::path::PathBuf;

use crate::error::Result;
use crate::exporter::export_to_file;
use crate::settings::load_settings;

use super::open_db;

pub fn run(year: Option<i32>, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db()?;

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let dir = PathBuf::from(&settings.data_dir).join("exports");
            std::fs::create_dir_all(&dir)?;
            let label = year.map_or_else(|| "all".to_string(), |y| y.to_string());
            dir.join(format!("centerbooks-{label}.xlsx"))
        }
    };

    let summary = export_to_file(&conn, year, &path)?;
    println!(
        "Exported {} income and {} expense rows to {}",
        summary.income_rows,
        summary.expense_rows,
        path.display()
    );
    Ok(())
}
