//! Error types for the ingestion pipeline

use carton_gatekeeper::GatekeeperError;
use carton_store::StoreError;
use thiserror::Error;

/// Errors that abort a whole batch
///
/// Problems with individual records never surface here; they are reported
/// per record in the [`IngestReport`](crate::IngestReport).
#[derive(Error, Debug)]
pub enum IngestError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validator setup error
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] GatekeeperError),

    /// Batch exceeds the configured size
    #[error("Batch too large: {0} records (max: {1})")]
    BatchTooLarge(usize, usize),

    /// Candidate producer failed
    #[error("Source error: {0}")]
    Source(String),

    /// A shared lock was poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),

    /// A jurisdiction task failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(e: tokio::task::JoinError) -> Self {
        IngestError::Task(e.to_string())
    }
}
