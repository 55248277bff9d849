//! Carton CLI library.
//!
//! Command-line surface over the decision-graph engine: batch ingestion,
//! record validation, consistency checks and graph queries against a
//! snapshot file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
