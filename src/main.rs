// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use expense_tracker::{
    read_drafts, write_expenses, Config, ExpenseRepository, SqliteStore, Summary,
};
use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: expense-tracker [import <file.csv> | export <file.csv> | report]";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None => {
            // UI mode (default)
            let config = Config::for_ui();
            init_logging(&config);
            run_ui_mode(&config)
        }
        Some("import") => {
            let config = Config::default();
            init_logging(&config);
            run_import(&config, path_arg(&args)?)
        }
        Some("export") => {
            let config = Config::default();
            init_logging(&config);
            run_export(&config, path_arg(&args)?)
        }
        Some("report") => {
            let config = Config::default();
            init_logging(&config);
            run_report(&config)
        }
        Some(other) => bail!("Unknown command '{}'\n{}", other, USAGE),
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn path_arg(args: &[String]) -> Result<&Path> {
    match args.get(2) {
        Some(path) => Ok(Path::new(path)),
        None => bail!("Missing CSV path\n{}", USAGE),
    }
}

fn open_repository(config: &Config) -> Result<ExpenseRepository<SqliteStore>> {
    info!(path = %config.database_path.display(), "opening database");
    let store = SqliteStore::open(&config.database_path)?;
    Ok(ExpenseRepository::new(store))
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("📂 Importing expenses from {}", csv_path.display());

    let drafts = read_drafts(csv_path)?;
    println!("✓ Read {} rows", drafts.len());

    let mut repo = open_repository(config)?;
    let summary = repo.import_expenses(&drafts)?;

    println!("✓ Inserted: {} expenses", summary.inserted);
    if !summary.rejected.is_empty() {
        println!("✗ Rejected: {} rows", summary.rejected.len());
        for (index, error) in &summary.rejected {
            // +2: one for the header, one for 1-based line numbers
            println!("   line {}: {}", index + 2, error);
        }
    }

    Ok(())
}

fn run_export(config: &Config, csv_path: &Path) -> Result<()> {
    let repo = open_repository(config)?;
    let expenses = repo.get_expenses()?;

    write_expenses(csv_path, &expenses)?;
    println!("✓ Exported {} expenses to {}", expenses.len(), csv_path.display());

    Ok(())
}

fn run_report(config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let summary = Summary::build(&repo)?;

    println!("{}", summary.to_json()?);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let repo = open_repository(config)?;

    let mut app = ui::App::new(repo)?;
    ui::run_ui(&mut app)?;

    println!("✅ Expense tracker closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: expense-tracker import|export|report");
    std::process::exit(1);
}
