//! Database connection management and the repository layer.
//!
//! Repositories are `Clone` handles over a shared [`sqlx::PgPool`]. Writes
//! that the domain requires to be idempotent (disclosures, the corp-code
//! directory) use conflict-ignoring or upserting SQL so replays are safe.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub mod company_profile_repository;
pub mod corp_code_repository;
pub mod disclosure_repository;
pub mod financial_statement_repository;
pub mod partner_company_repository;

pub use company_profile_repository::{CompanyProfileRepository, CompanyProfileRow, NewCompanyProfile};
pub use corp_code_repository::{CorpCodeRepository, CorpCodeRow};
pub use disclosure_repository::{DisclosureRepository, NewDisclosure};
pub use financial_statement_repository::{
    FinancialStatementRepository, FinancialStatementRow, NewFinancialStatementRow, StatementPeriod,
};
pub use partner_company_repository::{PartnerCompanyRepository, PartnerCompanyRow};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/eds-sync".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Owns the connection pool; repositories are built from it.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout);
        if let Some(idle) = config.idle_timeout {
            options = options.idle_timeout(idle);
        }

        let pool = options
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        info!(
            "Database pool ready: max_connections={}",
            config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
        Ok(())
    }
}
