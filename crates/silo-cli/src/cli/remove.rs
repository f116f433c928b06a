use crate::cli::{resolve_silo, RemoveArgs};
use crate::config::SilolinkConfig;
use anyhow::Result;
use silo_core::*;
use std::sync::Arc;

pub fn run(args: RemoveArgs, config: SilolinkConfig) -> Result<()> {
    let store = Arc::new(RedbStore::open(config.db_path())?);
    let silo_id = match &args.silo {
        Some(key) => Some(resolve_silo(&store, key)?.id),
        None => None,
    };
    let builder = LinkGraphBuilder::new(store.clone(), store, config.engine_config())?;

    if builder.remove_links(args.node, silo_id)? {
        println!("✅ Removed generated links from document {}", args.node);
    } else {
        println!("No generated links found in document {}", args.node);
    }
    Ok(())
}
