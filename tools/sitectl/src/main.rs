//! SiteCtl - Operator CLI for the SwapTrack site database
//!
//! Initializes the schema, imports tracking spreadsheets without going
//! through HTTP, and prints quick statistics after an import.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use common::sqlite::SqliteClient;
use sitesrv::ingest::normalize::normalize_rows;
use sitesrv::ingest::validate::validate_rows;
use sitesrv::ingest::workbook::{parse_workbook, FileFormat};
use sitesrv::store::{GroupColumn, SiteStore};
use sitesrv::SiteSrvError;

#[derive(Parser)]
#[command(name = "sitectl")]
#[command(about = "SiteCtl - SwapTrack site database management tool")]
#[command(long_about = "SiteCtl - SwapTrack site database management tool

Commands:
  init        Initialize the sites schema
  import      Import a tracking spreadsheet (.xlsx or .csv)
  stats       Show row count and distribution facts

Examples:
  sitectl init                          # Create data/swaptrack.db
  sitectl import tracker.xlsx           # Import a spreadsheet
  sitectl stats                         # Verify what was imported

Use 'sitectl <command> --help' for more information on a specific command.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Database file path (default: data/swaptrack.db)
    #[arg(long = "db-path", global = true)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the sites schema
    Init {
        /// Delete an existing database file first
        #[arg(short, long)]
        force: bool,
    },

    /// Import a tracking spreadsheet without going through HTTP
    Import {
        /// Path to the .xlsx or .csv file
        file: PathBuf,
    },

    /// Show row count and distribution facts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    let db_path = resolve_db_path(cli.db_path.as_deref());

    match cli.command {
        Commands::Init { force } => init_command(&db_path, force).await,
        Commands::Import { file } => import_command(&db_path, &file).await,
        Commands::Stats => stats_command(&db_path).await,
    }
}

/// CLI override first, then the shared env/default resolution
fn resolve_db_path(override_path: Option<&str>) -> String {
    match override_path {
        Some(path) => path.to_string(),
        None => common::bootstrap_args::ServiceArgs::default().get_db_path(),
    }
}

async fn open_store(db_path: &str) -> Result<SiteStore> {
    let client = SqliteClient::new(db_path)
        .await
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    Ok(SiteStore::new(Arc::new(client)))
}

async fn init_command(db_path: &str, force: bool) -> Result<()> {
    if force && Path::new(db_path).exists() {
        std::fs::remove_file(db_path)
            .with_context(|| format!("Failed to remove {db_path}"))?;
        // Remove WAL and SHM files if they exist
        for suffix in ["-wal", "-shm"] {
            let sidecar = format!("{db_path}{suffix}");
            if Path::new(&sidecar).exists() {
                let _ = std::fs::remove_file(&sidecar);
            }
        }
        println!("{} Removed existing database", "-".bright_cyan());
    }

    let store = open_store(db_path).await?;
    store.init_schema().await?;

    println!(
        "{} Schema ready at {}",
        "OK".bright_green(),
        db_path.bright_yellow()
    );
    Ok(())
}

async fn import_command(db_path: &str, file: &Path) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let Some(format) = FileFormat::from_filename(file_name) else {
        bail!("Unsupported file extension: {} (use .xlsx or .csv)", file.display());
    };

    let payload =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    println!(
        "{} {} ({} bytes)",
        "Importing:".bright_cyan(),
        file.display(),
        payload.len()
    );

    let table = parse_workbook(&payload, format).context("Failed to decode workbook")?;
    tracing::debug!("Decoded {} data row(s)", table.len());

    match validate_rows(&table) {
        Ok(()) => {},
        Err(SiteSrvError::ValidationError(messages)) => {
            eprintln!(
                "{} {} row(s) failed validation:",
                "ERROR".red(),
                messages.len()
            );
            for message in &messages {
                eprintln!("  {} {}", "-".red(), message);
            }
            std::process::exit(1);
        },
        Err(e) => return Err(e.into()),
    }

    let records = normalize_rows(&table);
    let store = open_store(db_path).await?;
    store.init_schema().await?;
    let written = store.upsert_batch(&records).await?;

    println!(
        "{} {} row(s) written to {}",
        "OK".bright_green(),
        written.to_string().bright_yellow(),
        db_path
    );
    Ok(())
}

async fn stats_command(db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        bail!("Database not found at {db_path}. Run 'sitectl init' first.");
    }

    let store = open_store(db_path).await?;
    let total = store.count().await?;

    println!("{}", "Site Database Statistics".bright_cyan());
    println!("  Database:    {db_path}");
    println!("  Total sites: {}", total.to_string().bright_yellow());

    for (title, column) in [
        ("Top provinces", GroupColumn::Province),
        ("Top clusters", GroupColumn::McCluster),
    ] {
        let rows = store.distribution(column, 10).await?;
        if rows.is_empty() {
            continue;
        }
        println!();
        println!("  {}", title.bright_cyan());
        for (label, n) in rows {
            println!("    {:<30} {}", label, n);
        }
    }

    Ok(())
}
