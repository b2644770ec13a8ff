//! Community health tracker CLI.
//!
//! Usage:
//!   community-health serve
//!   community-health init-db [--reset]
//!   community-health seed [--patients <n>] [--days <d>] [--rng-seed <s>]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use community_health_lib::config::{self, AppConfig};
use community_health_lib::core_state::{self, CoreState};
use community_health_lib::simulation::{self, SeedOptions};
use community_health_lib::{api, db, init_tracing};

#[derive(Parser)]
#[command(name = "community-health")]
#[command(version)]
#[command(about = "Community health indicator tracking service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides CHT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,

    /// Create the schema, optionally dropping existing data first
    InitDb {
        /// Delete the database file and recreate it
        #[arg(long)]
        reset: bool,
    },

    /// Fill the database with simulated patients and readings
    Seed {
        /// Number of patients to create
        #[arg(long, default_value_t = simulation::DEFAULT_SEED_PATIENTS)]
        patients: u32,

        /// Days of history to generate
        #[arg(long, default_value_t = simulation::DEFAULT_SEED_DAYS)]
        days: u32,

        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        rng_seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);
    tracing::debug!(db = %config.db_path.display(), "Using database");

    match cli.command {
        Commands::Serve => {
            let core = Arc::new(CoreState::new(config));
            // Fail fast on an unusable database before binding
            core.open_db()?;
            api::serve(core).await?;
        }
        Commands::InitDb { reset } => {
            let conn = if reset {
                db::reset_database(&config.db_path)?
            } else {
                db::open_database(&config.db_path)?
            };
            let tables = db::count_tables(&conn)?;
            println!("Database ready at {} ({tables} tables)", config.db_path.display());
        }
        Commands::Seed {
            patients,
            days,
            rng_seed,
        } => {
            let mut conn = db::open_database(&config.db_path)?;
            let options = SeedOptions {
                patients,
                days,
                rng_seed,
            };
            let report = simulation::seed(&mut conn, &config, &options, core_state::now())?;
            println!(
                "Created {} patients and {} indicator records",
                report.patients, report.indicators
            );
        }
    }
    Ok(())
}
