pub mod config_cmd;
pub mod generate;
pub mod import;
pub mod links;
pub mod preview;
pub mod remove;
pub mod silos;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use silo_core::{RedbStore, Silo, SiloId, Store};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "silolink")]
#[command(version, about = "Internal link graphs for content silos")]
pub struct Cli {
    /// Path to silolink.toml
    #[arg(
        long,
        global = true,
        env = "SILOLINK_CONFIG",
        default_value = "silolink.toml"
    )]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "SILOLINK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load documents, silos and exclusions from a JSON fixture
    Import(ImportArgs),
    /// Generate links for a silo
    Generate(GenerateArgs),
    /// Show the links a generation would create, without writing
    Preview(PreviewArgs),
    /// Remove generated links from a document
    Remove(RemoveArgs),
    /// List silos
    Silos(SilosArgs),
    /// List generated links
    Links(LinksArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

// --- Import args ---

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// Parse and report without writing
    #[arg(long)]
    pub dry_run: bool,
}

// --- Generation args ---

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Silo id or name
    pub silo: String,
    /// Only edges touching these documents
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<u64>,
    /// Output format: table (default) | json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Silo id or name
    pub silo: String,
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<u64>,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Document id
    pub node: u64,
    /// Only links belonging to this silo (id or name)
    #[arg(long)]
    pub silo: Option<String>,
}

// --- Listing args ---

#[derive(Args, Debug)]
pub struct SilosArgs {
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct LinksArgs {
    /// Only links from this document
    #[arg(long)]
    pub node: Option<u64>,
    /// Only links in this silo (id or name)
    #[arg(long)]
    pub silo: Option<String>,
    /// Include removed links
    #[arg(long)]
    pub all: bool,
    #[arg(long, default_value = "table")]
    pub format: String,
}

/// Find a silo by id, or by case-insensitive name
pub fn resolve_silo(store: &RedbStore, key: &str) -> Result<Silo> {
    if let Ok(id) = key.parse::<SiloId>() {
        if let Some(silo) = store.get_silo(id)? {
            return Ok(silo);
        }
    }

    let mut matches: Vec<Silo> = store
        .list_silos()?
        .into_iter()
        .filter(|s| s.name.eq_ignore_ascii_case(key.trim()))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("No silo with id or name '{}'", key),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("{} silos are named '{}'; use the id", n, key),
    }
}

pub fn restrict_to(only: &[u64]) -> Option<&[u64]> {
    (!only.is_empty()).then_some(only)
}

// --- Table printing helpers ---

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_core::LinkingMode;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 5), "a lo…");
    }

    #[test]
    fn test_resolve_silo_by_id_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();
        let silo = Silo::new("Solar Power", LinkingMode::Linear);
        store.put_silo(&silo).unwrap();

        assert_eq!(resolve_silo(&store, &silo.id.to_string()).unwrap().id, silo.id);
        assert_eq!(resolve_silo(&store, "solar power").unwrap().id, silo.id);
        assert!(resolve_silo(&store, "wind").is_err());

        store.put_silo(&Silo::new("Solar Power", LinkingMode::Chained)).unwrap();
        assert!(resolve_silo(&store, "Solar Power").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["silolink", "generate", "Solar", "--only", "3,4"]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.silo, "Solar");
                assert_eq!(args.only, vec![3, 4]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
