//! CLI command definitions and argument parsing.

use carton_domain::Relation;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Carton CLI - Maintain the legal decision graph.
#[derive(Debug, Parser)]
#[command(name = "carton")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CARTON_CONFIG", default_value = "carton.toml")]
    pub config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Human-readable text (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a default configuration file
    Init(InitArgs),

    /// Ingest candidate records into the graph
    Ingest(IngestArgs),

    /// Validate candidate records without touching the graph
    Validate(ValidateArgs),

    /// Check edge symmetry and orphaned failure nodes
    Check,

    /// Compare a jurisdiction's nodes against the federal floor
    Diff(DiffArgs),

    /// Show one node
    Show(ShowArgs),

    /// Walk the graph along one relation
    Traverse(TraverseArgs),
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// JSON files holding one record or an array of records
    pub files: Vec<PathBuf>,

    /// JSON file holding an array of crawled page captures
    #[arg(long)]
    pub captures: Option<PathBuf>,

    /// JSON file holding an array of crawled statutes, rules and cases to
    /// attribute to the record files' nodes
    #[arg(long)]
    pub leaves: Option<PathBuf>,

    /// Reject records that carry any warning
    #[arg(long)]
    pub strict: bool,

    /// Report what would happen without saving the snapshot
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// JSON file holding one record or an array of records
    pub file: PathBuf,
}

/// Arguments for the diff command.
#[derive(Debug, Parser)]
pub struct DiffArgs {
    /// Jurisdiction code (e.g. TX)
    pub jurisdiction: String,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Node key (e.g. TX_DEC-01)
    pub key: String,

    /// Show every version, oldest first
    #[arg(long)]
    pub history: bool,
}

/// Arguments for the traverse command.
#[derive(Debug, Parser)]
pub struct TraverseArgs {
    /// Starting node key
    pub key: String,

    /// Relation to follow
    #[arg(short, long, value_enum, default_value = "leads-to")]
    pub relation: RelationArg,

    /// Maximum number of hops
    #[arg(short, long, default_value = "10")]
    pub depth: usize,
}

/// Relation argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RelationArg {
    /// Upstream nodes
    TriggeredBy,
    /// Downstream nodes
    LeadsTo,
    /// Failure modes
    FailureModes,
    /// Overseen nodes
    Oversees,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Text => crate::config::OutputFormat::Text,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<RelationArg> for Relation {
    fn from(relation: RelationArg) -> Self {
        match relation {
            RelationArg::TriggeredBy => Relation::TriggeredBy,
            RelationArg::LeadsTo => Relation::LeadsTo,
            RelationArg::FailureModes => Relation::FailureModes,
            RelationArg::Oversees => Relation::Oversees,
        }
    }
}
