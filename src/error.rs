//! Error types shared across the ingestion and risk core.
//!
//! Repositories and the coordinator work in `anyhow::Result` and attach
//! context at each await point; the typed [`ServiceError`] is the boundary
//! currency for callers that need a disposition (the API layer maps it to an
//! HTTP status).

use thiserror::Error;

/// Caller-visible error kinds for registry, client and evaluator operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad caller input: malformed year, unknown report code, blank corp code.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested profile, partner or corp code is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx from EDS or a transport failure that is not downgradable.
    #[error("external source error: {0}")]
    ExternalSource(String),

    /// Unparseable amount or payload. The affected value is treated as
    /// absent by callers; this variant only surfaces when the whole payload
    /// is unusable.
    #[error("transient parse failure: {0}")]
    TransientParsing(String),

    /// Violated internal precondition, e.g. both owner ids set.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// HTTP status the API boundary should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::ExternalSource(_) => 500,
            ServiceError::TransientParsing(_)
            | ServiceError::Invariant(_)
            | ServiceError::Internal(_) => 500,
        }
    }

    /// Invariant check: logs in release, panics in debug builds.
    pub fn invariant(condition: bool, message: &str) -> Result<(), ServiceError> {
        if condition {
            return Ok(());
        }
        debug_assert!(condition, "invariant violated: {}", message);
        tracing::error!("invariant violated: {}", message);
        Err(ServiceError::Invariant(message.to_string()))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Internal(anyhow::Error::new(err).context("database error"))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            ServiceError::InvalidArgument("bad year".into()).http_status(),
            400
        );
        assert_eq!(ServiceError::NotFound("corp".into()).http_status(), 404);
        assert_eq!(
            ServiceError::ExternalSource("503 from EDS".into()).http_status(),
            500
        );
        assert_eq!(
            ServiceError::Internal(anyhow::anyhow!("boom")).http_status(),
            500
        );
    }
}
