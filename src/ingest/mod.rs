//! Event-driven ingestion: the per-event coordinator and the partitioned
//! consumer pool.

pub mod coordinator;
pub mod worker;

pub use coordinator::{completeness_score, IngestionCoordinator};
pub use worker::IngestWorker;
