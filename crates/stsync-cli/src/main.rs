mod pipeline;
mod run;
mod scheduler;
mod sinks;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::run::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "stsync")]
#[command(about = "Sync ServiceTitan customers into a flat Postgres contacts table")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass now
    Run {
        /// Print normalized rows as JSON lines instead of writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Abort the pass after this many seconds (overrides STSYNC_MAX_RUNTIME_SECS)
        #[arg(long)]
        max_runtime_secs: Option<u64>,
    },
    /// Run sync passes on a cron schedule until interrupted
    Schedule {
        /// Six-field cron expression (overrides STSYNC_SCHEDULE_CRON)
        #[arg(long)]
        cron: Option<String>,
    },
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check connectivity and that the destination table exists
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    // Loads `.env` before reading the environment.
    let config = Arc::new(stsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(config = ?config, "configuration loaded");

    match command {
        Commands::Run {
            dry_run,
            max_runtime_secs,
        } => {
            let options = RunOptions::from_config(&config, dry_run, max_runtime_secs);
            let summary = run::execute(&config, options).await?;
            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.schedule_cron.clone());
            let mut scheduler = scheduler::build_scheduler(Arc::clone(&config), &cron).await?;
            scheduler::shutdown_signal().await;
            scheduler.shutdown().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            let table = stsync_db::ContactTable::new(&config.table_name)?;
            let pool = stsync_db::connect_pool(
                &config.database_url,
                stsync_db::PoolConfig::from_app_config(&config),
            )
            .await?;
            stsync_db::health_check(&pool, &table).await?;
            tracing::info!(table = %table, "database reachable");
            Ok(ExitCode::SUCCESS)
        }
    }
}
