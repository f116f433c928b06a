use crate::cli::{resolve_silo, truncate, LinksArgs};
use crate::config::SilolinkConfig;
use anyhow::Result;
use silo_core::*;

pub fn run(args: LinksArgs, config: SilolinkConfig) -> Result<()> {
    let store = RedbStore::open(config.db_path())?;
    let silo_id = match &args.silo {
        Some(key) => Some(resolve_silo(&store, key)?.id),
        None => None,
    };

    let links = filter_links(store.list_links()?, args.node, silo_id, args.all);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    print_link_table(&links);
    Ok(())
}

pub fn filter_links(
    links: Vec<Link>,
    node: Option<NodeId>,
    silo: Option<SiloId>,
    include_removed: bool,
) -> Vec<Link> {
    links
        .into_iter()
        .filter(|l| include_removed || l.is_active())
        .filter(|l| node.map_or(true, |n| l.source == n))
        .filter(|l| silo.map_or(true, |s| l.silo_id == s))
        .collect()
}

fn print_link_table(links: &[Link]) {
    if links.is_empty() {
        println!("(no links)");
        return;
    }
    println!(
        "{:<8}  {:<8}  {:<30}  {:<15}  {:<8}  {}",
        "FROM", "TO", "ANCHOR", "PLACEMENT", "STATUS", "CREATED"
    );
    println!("{}", "─".repeat(100));
    for l in links {
        let placement = match l.placement {
            Placement::FirstParagraph => "first_paragraph",
            Placement::Natural => "natural",
        };
        let status = if l.is_active() { "active" } else { "removed" };
        println!(
            "{:<8}  {:<8}  {:<30}  {:<15}  {:<8}  {}",
            l.source,
            l.target,
            truncate(&l.anchor_text, 30),
            placement,
            status,
            l.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
