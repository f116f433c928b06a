mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::SilolinkConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing; `log` records from the engine are bridged in
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Config(cmd) => return cli::config_cmd::run(cmd, &cli.config),
        other => other,
    };

    let config = SilolinkConfig::load_or_default(&cli.config).with_data_dir(cli.data_dir);
    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
    }
    config.ensure_data_dir()?;
    tracing::debug!("Using database {}", config.db_path().display());

    match command {
        Commands::Import(args) => cli::import::run(args, config),
        Commands::Generate(args) => cli::generate::run(args, config),
        Commands::Preview(args) => cli::preview::run(args, config),
        Commands::Remove(args) => cli::remove::run(args, config),
        Commands::Silos(args) => cli::silos::run(args, config),
        Commands::Links(args) => cli::links::run(args, config),
        Commands::Config(_) => Ok(()),
    }
}
