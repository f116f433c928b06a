use crate::cli::{resolve_silo, restrict_to, GenerateArgs};
use crate::config::SilolinkConfig;
use anyhow::Result;
use silo_core::*;
use std::sync::Arc;

pub fn run(args: GenerateArgs, config: SilolinkConfig) -> Result<()> {
    let store = Arc::new(RedbStore::open(config.db_path())?);
    let silo = resolve_silo(&store, &args.silo)?;
    let builder = LinkGraphBuilder::new(store.clone(), store, config.engine_config())?;

    let metrics = builder.generate_with_report(silo.id, restrict_to(&args.only))?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    print_metrics(&silo, &metrics);
    Ok(())
}

fn print_metrics(silo: &Silo, metrics: &RunMetrics) {
    println!();
    println!("Silo '{}' ({})", silo.name, silo.id);
    println!("{}", "─".repeat(50));
    if let Some(mode) = metrics.mode {
        if mode != silo.mode {
            println!("Mode:       {} (requested {})", mode, silo.mode);
        } else {
            println!("Mode:       {}", mode);
        }
    }
    println!("Planned:    {:>6}", metrics.edges_planned);
    println!("Created:    {:>6}", metrics.edges_created);
    println!("Skipped:    {:>6}", metrics.skipped_total());
    for (reason, count) in &metrics.skipped {
        println!("  {:20} {:>6}", reason.as_str(), count);
    }
    if metrics.rollbacks > 0 {
        println!("Rollbacks:  {:>6}", metrics.rollbacks);
    }
    if metrics.suffixed_anchors > 0 {
        println!("Suffixed:   {:>6}", metrics.suffixed_anchors);
    }
    println!("Duration:   {:>6} ms", metrics.duration.as_millis());
    println!("{}", "─".repeat(50));
    println!();
}
