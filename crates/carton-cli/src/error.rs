//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ingestion engine error
    #[error("Engine error: {0}")]
    Ingest(#[from] carton_ingest::IngestError),

    /// Snapshot error
    #[error("Snapshot error: {0}")]
    Store(#[from] carton_store::StoreError),

    /// Validator setup error
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] carton_gatekeeper::GatekeeperError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The command ran but its result should fail the invocation
    #[error("{0}")]
    Failed(String),
}
