//! Operational entry point: corp-code directory sync and the ingest worker.
//!
//! ```bash
//! # One-off directory reconciliation from the EDS archive
//! EDS_API_KEY=... DATABASE_URL=postgresql://localhost/eds-sync \
//! cargo run --bin eds_worker -- sync-directory
//!
//! # Run the partitioned event consumers until interrupted
//! cargo run --bin eds_worker -- worker
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use eds_sync::bus::InMemoryBus;
use eds_sync::config::AppConfig;
use eds_sync::database::{
    CompanyProfileRepository, CorpCodeRepository, DatabaseManager, DisclosureRepository,
    FinancialStatementRepository,
};
use eds_sync::eds::{sync_directory, EdsClient};
use eds_sync::ingest::{IngestWorker, IngestionCoordinator};

#[derive(Parser)]
#[command(name = "eds_worker")]
#[command(about = "EDS ingestion worker - directory sync and partner event consumption")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the corp-code archive and reconcile the directory
    SyncDirectory,

    /// Run the partitioned partner-event consumers until interrupted
    Worker,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let db = DatabaseManager::new(config.database.clone()).await?;
    db.run_migrations().await?;
    let pool = db.pool().clone();

    let eds = Arc::new(EdsClient::new(config.eds.clone())?);

    match cli.command {
        Commands::SyncDirectory => {
            let directory = CorpCodeRepository::new(pool);
            let count = sync_directory(&eds, &directory).await?;
            info!("Directory sync finished: {} entries", count);
        }
        Commands::Worker => {
            let coordinator = Arc::new(IngestionCoordinator::new(
                eds,
                CompanyProfileRepository::new(pool.clone()),
                DisclosureRepository::new(pool.clone()),
                FinancialStatementRepository::new(pool.clone()),
                CorpCodeRepository::new(pool),
            ));

            let bus = InMemoryBus::new(config.bus.partitions);
            let worker = IngestWorker::new(coordinator);
            let mut handles = worker.spawn_partner_consumers(&bus, &config.bus);
            handles.extend(worker.spawn_legacy_consumers(&bus, &config.bus));
            info!(
                "Ingest worker running: group={}, partitions={}",
                config.bus.consumer_group_id, config.bus.partitions
            );

            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested, stopping consumers");
            for handle in handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
