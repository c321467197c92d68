use crate::db::{count, get_connection};
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    match settings.default_year {
        Some(y) => println!("Year:       {y}"),
        None => println!("Year:       (current year)"),
    }

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        println!();
        println!("Centers:   {}", count(&conn, "centers")?);
        println!("Programs:  {}", count(&conn, "programs")?);
        println!("Income:    {}", count(&conn, "income_records")?);
        println!("Expenses:  {}", count(&conn, "expense_records")?);
        println!("Imports:   {}", count(&conn, "imports")?);
    } else {
        println!();
        println!("Database not found. Run `centerbooks init` to set up.");
    }

    Ok(())
}
