pub mod export;
pub mod history;
pub mod import;
pub mod init;
pub mod lists;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{CenterBooksError, Result};
use crate::settings::get_db_path;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db() -> Result<Connection> {
    let db_path = get_db_path();
    if !db_path.exists() {
        return Err(CenterBooksError::Settings(format!(
            "No database found at {}\nRun `centerbooks init` to set one up.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

#[derive(Parser)]
#[command(
    name = "centerbooks",
    version,
    about = "Income and expense books for a chain of training centers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/centerbooks)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Accounting year to use when imports don't specify one
        #[arg(long = "default-year")]
        default_year: Option<i32>,
    },
    /// Import the income ("Doanh thu") and expense ("Chi phí") sheets of a workbook.
    Import {
        /// Path to an .xlsx/.xls/.ods workbook
        file: String,
        /// Accounting year for rows without a "Năm" column
        #[arg(long)]
        year: Option<i32>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List training centers.
    Centers,
    /// List programs.
    Programs,
    /// Revenue, expense and profit reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export records to a workbook in import layout.
    Export {
        /// Only records of this year
        #[arg(long)]
        year: Option<i32>,
        /// Output path (default: <data_dir>/exports/centerbooks-<year|all>.xlsx)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show past imports.
    History,
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Month-by-month revenue, expense and profit.
    Pnl {
        #[arg(long)]
        year: Option<i32>,
        /// Restrict to one center
        #[arg(long)]
        center: Option<String>,
    },
    /// Totals per center.
    Centers {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Expense totals per category.
    Expenses {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        center: Option<String>,
    },
}
