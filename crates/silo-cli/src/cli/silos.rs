use crate::cli::{truncate, SilosArgs};
use crate::config::SilolinkConfig;
use anyhow::Result;
use silo_core::*;

pub fn run(args: SilosArgs, config: SilolinkConfig) -> Result<()> {
    let store = RedbStore::open(config.db_path())?;
    let silos = store.list_silos()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&silos)?);
        return Ok(());
    }

    if silos.is_empty() {
        println!("(no silos)");
        return Ok(());
    }
    println!(
        "{:<36}  {:<14}  {:<8}  {:<7}  {}",
        "ID", "MODE", "HUB", "MEMBERS", "NAME"
    );
    println!("{}", "─".repeat(90));
    for silo in &silos {
        let hub = silo.hub.map(|h| h.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<36}  {:<14}  {:<8}  {:<7}  {}",
            silo.id,
            silo.mode.as_str(),
            hub,
            silo.members.len(),
            truncate(&silo.name, 30)
        );
    }

    let stats = store.stats()?;
    println!();
    println!(
        "{} documents, {} active links, {} removed",
        stats.node_count, stats.active_links, stats.removed_links
    );
    Ok(())
}
