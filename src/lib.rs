//! eds-sync - partner company ingestion and financial-risk core.
//!
//! The crate ingests Korean corporate disclosure data from the EDS Open API,
//! persists it in normalized form, and evaluates partner companies against a
//! fixed twelve-item financial risk rubric.
//!
//! ## Data flow
//!
//! Partner registry writes a registration and emits an event; the ingestion
//! coordinator consumes it, fetches the company profile, recent disclosures
//! and recent financial statements from EDS, and reconciles them into the
//! database with idempotent writes. The risk evaluator later reads the
//! stored statement rows on demand - it is a pure function of them.

pub mod bus;
pub mod config;
pub mod database;
pub mod eds;
pub mod error;
pub mod ingest;
pub mod partner;
pub mod risk;

pub use config::AppConfig;
pub use database::{DatabaseConfig, DatabaseManager};
pub use error::{ServiceError, ServiceResult};
