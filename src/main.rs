use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod classify;
mod db;
mod export;
mod metrics;
mod models;
mod report;

use export::{ExportKind, ExportResponse};
use models::{FocusArea, Program, ProgramFilters};

#[derive(Parser)]
#[command(name = "program-analytics")]
#[command(about = "Program performance analytics engine for the back office", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Build the JSON analytics summary for the selected programs
    Summary {
        #[arg(long)]
        program: Option<Uuid>,
        #[arg(long, value_enum)]
        focus_area: Option<FocusArea>,
        #[arg(long)]
        year: Option<i32>,
        /// Write the summary here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 30)]
        fetch_timeout_secs: u64,
    },
    /// Export the hierarchy and analytics as delimited-text tables
    Export {
        #[arg(long)]
        program: Option<Uuid>,
        #[arg(long, value_enum)]
        focus_area: Option<FocusArea>,
        #[arg(long)]
        year: Option<i32>,
        /// Record types to include; defaults to all of them
        #[arg(long, value_enum, value_delimiter = ',')]
        include: Vec<ExportKind>,
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long, default_value = "export")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 30)]
        fetch_timeout_secs: u64,
    },
}

/// Single fetch from the record store. Failure or timeout here aborts the
/// whole request; there is no partial-result path.
async fn load_programs(
    pool: &PgPool,
    filters: &ProgramFilters,
    timeout_secs: u64,
) -> anyhow::Result<Vec<Program>> {
    tokio::time::timeout(
        Duration::from_secs(timeout_secs.max(1)),
        db::fetch_programs(pool, filters),
    )
    .await
    .context("timed out fetching program records")?
    .context("failed to fetch program records")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Summary {
            program,
            focus_area,
            year,
            out,
            fetch_timeout_secs,
        } => {
            let filters = ProgramFilters {
                program_id: program,
                focus_area,
                year,
            };
            let programs = load_programs(&pool, &filters, fetch_timeout_secs).await?;
            let summary = report::build_summary(&programs, Utc::now().date_naive());
            let json = serde_json::to_string_pretty(&summary)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Summary written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Export {
            program,
            focus_area,
            year,
            include,
            format,
            out_dir,
            fetch_timeout_secs,
        } => {
            let filters = ProgramFilters {
                program_id: program,
                focus_area,
                year,
            };
            let kinds = if include.is_empty() {
                ExportKind::ALL.to_vec()
            } else {
                include
            };
            let programs = load_programs(&pool, &filters, fetch_timeout_secs).await?;

            match export::run_export(&programs, &kinds, &format, Utc::now().date_naive())? {
                ExportResponse::Unsupported {
                    requested,
                    supported,
                } => {
                    println!(
                        "Export format {requested:?} is not implemented. Supported formats: {}.",
                        supported.join(", ")
                    );
                }
                ExportResponse::Completed(tables) => {
                    std::fs::create_dir_all(&out_dir)
                        .with_context(|| format!("failed to create {}", out_dir.display()))?;
                    for (name, content) in &tables {
                        let path = out_dir.join(name);
                        std::fs::write(&path, content)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                    }
                    println!(
                        "Wrote {} table(s) for {} program(s) to {}.",
                        tables.len(),
                        programs.len(),
                        out_dir.display()
                    );
                }
            }
        }
    }

    Ok(())
}
