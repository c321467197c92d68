mod cli;
mod db;
mod dimensions;
mod error;
mod exporter;
mod fmt;
mod importer;
mod mapper;
mod models;
mod month;
mod reports;
mod settings;
mod workbook;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ReportCommands};
use dimensions::DimensionKind;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "centerbooks=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            default_year,
        } => cli::init::run(data_dir, default_year),
        Commands::Import { file, year, json } => cli::import::run(&file, year, json),
        Commands::Centers => cli::lists::run(DimensionKind::Center),
        Commands::Programs => cli::lists::run(DimensionKind::Program),
        Commands::Report { command } => match command {
            ReportCommands::Pnl { year, center } => cli::report::pnl(year, center),
            ReportCommands::Centers { year } => cli::report::centers(year),
            ReportCommands::Expenses { year, center } => cli::report::expenses(year, center),
        },
        Commands::Export { year, output } => cli::export::run(year, output),
        Commands::History => cli::history::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
