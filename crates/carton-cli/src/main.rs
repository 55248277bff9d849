//! Carton CLI - Command-line interface for the legal decision graph.

use anyhow::Context;
use carton_cli::{
    cli::{Cli, Command},
    commands,
    config::{Config, OutputFormat},
    output::Formatter,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let format: OutputFormat = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color);

    match cli.command {
        Command::Init(args) => commands::execute_init(args, &cli.config, &formatter)?,
        Command::Ingest(args) => {
            commands::execute_ingest(args, &config, &formatter).await?;
        }
        Command::Validate(args) => commands::execute_validate(args, &config, &formatter)?,
        Command::Check => commands::execute_check(&config, &formatter).await?,
        Command::Diff(args) => commands::execute_diff(args, &config, &formatter).await?,
        Command::Show(args) => commands::execute_show(args, &config, &formatter).await?,
        Command::Traverse(args) => commands::execute_traverse(args, &config, &formatter).await?,
    }

    Ok(())
}
