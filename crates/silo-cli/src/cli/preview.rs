use crate::cli::{resolve_silo, restrict_to, truncate, PreviewArgs};
use crate::config::SilolinkConfig;
use anyhow::Result;
use silo_core::*;
use std::sync::Arc;

pub fn run(args: PreviewArgs, config: SilolinkConfig) -> Result<()> {
    let store = Arc::new(RedbStore::open(config.db_path())?);
    let silo = resolve_silo(&store, &args.silo)?;
    let builder = LinkGraphBuilder::new(store.clone(), store, config.engine_config())?;

    let preview = builder.preview(silo.id, restrict_to(&args.only))?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    print_preview(&preview);
    Ok(())
}

fn print_preview(preview: &Preview) {
    if preview.is_empty() {
        println!("(no links proposed)");
        return;
    }
    println!(
        "{:<8}  {:<8}  {:<30}  {:<7}  {}",
        "FROM", "TO", "ANCHOR", "OFFSET", "TARGET"
    );
    println!("{}", "─".repeat(90));
    for (source, entries) in preview {
        for e in entries {
            println!(
                "{:<8}  {:<8}  {:<30}  {:<7}  {}",
                source,
                e.target_id,
                truncate(&e.anchor_text, 30),
                e.insertion_offset,
                truncate(&e.target_title, 30)
            );
            if !e.anchor_variations.is_empty() {
                println!("{:>20}also: {}", "", e.anchor_variations.join(", "));
            }
        }
    }
}
