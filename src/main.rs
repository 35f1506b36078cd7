use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use cricket_analytics::config::Settings;
use cricket_analytics::{corpus, db, queries, report};

#[derive(Parser)]
#[command(name = "cricket_analytics", about = "Cricket match ETL and analytics over SQLite")]
struct Cli {
    /// SQLite database path (overrides settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract raw match documents into the CSV artifact
    Process {
        /// Directory of raw match documents
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Load the CSV artifact into the per-format tables
    Build,
    /// Process + build in one pass
    Run {
        /// Directory of raw match documents
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Show tables, row counts and schema
    Verify,
    /// Run the analytical query catalog
    Query {
        /// Run a single query by id (1-20)
        #[arg(long)]
        id: Option<u8>,
        /// Emit results as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// List the query catalog
    List,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "settings loaded");

    let result = execute(cli.command, settings, cli.db);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", report::format_duration(elapsed));
    }

    result
}

/// Dispatch one subcommand. Errors are returned, never short-circuited, so
/// the caller can still print the timing footer.
fn execute(command: Commands, settings: Settings, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Process { data_dir } => {
            let settings = settings.with_overrides(data_dir, db_path);
            process(&settings).map(|_| ())
        }
        Commands::Build => {
            let settings = settings.with_overrides(None, db_path);
            load_csv(&settings).and_then(|rows| build(&settings, rows))
        }
        Commands::Run { data_dir } => {
            let settings = settings.with_overrides(data_dir, db_path);
            process(&settings).and_then(|rows| build(&settings, rows))
        }
        Commands::Verify => {
            let settings = settings.with_overrides(None, db_path);
            let conn = db::connect(&settings.db_path)?;
            db::verify(&conn)?.print();
            Ok(())
        }
        Commands::Query { id, json } => {
            let settings = settings.with_overrides(None, db_path);
            let conn = db::connect(&settings.db_path)?;
            let specs: Vec<queries::QuerySpec> = match id {
                Some(n) => match queries::find(n) {
                    Some(spec) => vec![*spec],
                    None => bail!("no query with id {} (expected 1-{})", n, queries::CATALOG.len()),
                },
                None => queries::CATALOG.to_vec(),
            };
            let batch = queries::run_batch(&conn, &specs);
            if json {
                println!("{}", report::export_json(&batch)?);
            } else {
                report::print_batch(&batch);
            }
            Ok(())
        }
        Commands::List => {
            for q in &queries::CATALOG {
                println!("{:>3}  {}", q.id, q.title);
            }
            Ok(())
        }
    }
}

/// Raw documents -> CSV artifact. Returns the extracted rows.
fn process(settings: &Settings) -> anyhow::Result<Vec<cricket_analytics::MatchRow>> {
    let extraction = corpus::extract_dir(&settings.data_dir, &settings.file_suffix)?;
    extraction.print();
    corpus::write_csv(&settings.csv_path, &extraction.rows)
        .with_context(|| format!("Failed to write {:?}", settings.csv_path))?;
    println!(
        "Saved {} matches to {:?}",
        extraction.rows.len(),
        settings.csv_path
    );
    Ok(extraction.rows)
}

fn load_csv(settings: &Settings) -> anyhow::Result<Vec<cricket_analytics::MatchRow>> {
    let rows = corpus::read_csv(&settings.csv_path)
        .with_context(|| format!("Failed to read {:?}", settings.csv_path))?;
    println!("Loaded {} rows from {:?}", rows.len(), settings.csv_path);
    Ok(rows)
}

/// Rows -> partitions -> store, followed by a verification pass.
fn build(settings: &Settings, rows: Vec<cricket_analytics::MatchRow>) -> anyhow::Result<()> {
    let parts = corpus::build_partitions(rows, &settings.csv_path)?;
    parts.print();

    let conn = db::connect(&settings.db_path)?;
    db::replace_partitions(&conn, &parts)?;
    println!();
    db::verify(&conn)?.print();
    println!("\nDatabase created successfully at {:?}", settings.db_path);
    Ok(())
}
