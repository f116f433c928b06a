use crate::cli::ImportArgs;
use crate::config::SilolinkConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use silo_core::*;
use std::path::Path;

/// A JSON fixture describing documents, silos and exclusions
#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub silos: Vec<SiloRecord>,
    #[serde(default)]
    pub excluded_targets: Vec<NodeId>,
    #[serde(default)]
    pub excluded_anchors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub permalink: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "published")]
    pub publish_state: PublishState,
}

fn published() -> PublishState {
    PublishState::Published
}

impl NodeRecord {
    fn into_node(self) -> Node {
        let mut node = Node::new(self.id, self.title, self.body)
            .with_categories(self.categories)
            .with_publish_state(self.publish_state);
        if let Some(permalink) = self.permalink {
            node = node.with_permalink(permalink);
        }
        node
    }
}

#[derive(Debug, Deserialize)]
pub struct SiloRecord {
    pub name: String,
    pub mode: LinkingMode,
    pub hub: Option<NodeId>,
    #[serde(default)]
    pub members: Vec<NodeId>,
    #[serde(default)]
    pub settings: RawSettings,
}

impl SiloRecord {
    fn into_silo(self) -> Silo {
        let mut silo = Silo::new(self.name, self.mode)
            .with_members(&self.members)
            .with_settings(self.settings);
        silo.hub = self.hub;
        silo
    }
}

pub fn parse_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse fixture JSON")
}

pub fn run(args: ImportArgs, config: SilolinkConfig) -> Result<()> {
    let path = &args.file;
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let fixture = parse_fixture(path)?;
    println!(
        "Parsed {} documents, {} silos, {} excluded targets, {} excluded anchors",
        fixture.nodes.len(),
        fixture.silos.len(),
        fixture.excluded_targets.len(),
        fixture.excluded_anchors.len()
    );

    if args.dry_run {
        println!("Dry run, no changes written.");
        for node in &fixture.nodes {
            println!("  [{}] {}", node.id, node.title);
        }
        for silo in &fixture.silos {
            println!("  silo '{}' ({}, {} members)", silo.name, silo.mode, silo.members.len());
        }
        return Ok(());
    }

    let store = RedbStore::open(config.db_path())?;
    let report = apply(&store, fixture)?;
    println!(
        "✅ Imported {} documents and {} silos ({} errors)",
        report.nodes, report.silos, report.errors
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportReport {
    pub nodes: usize,
    pub silos: usize,
    pub errors: usize,
}

/// Write a fixture. A silo whose name already exists keeps its id, so
/// re-importing updates it instead of creating a twin.
pub fn apply(store: &RedbStore, fixture: Fixture) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for record in fixture.nodes {
        let title = record.title.clone();
        match store.put_node(&record.into_node()) {
            Ok(()) => report.nodes += 1,
            Err(e) => {
                eprintln!("  Error storing document '{}': {}", title, e);
                report.errors += 1;
            }
        }
    }

    let existing = store.list_silos()?;
    for record in fixture.silos {
        let mut silo = record.into_silo();
        if let Some(prev) = existing.iter().find(|s| s.name == silo.name) {
            silo.id = prev.id;
            silo.created_at = prev.created_at;
        }
        match store.put_silo(&silo) {
            Ok(()) => report.silos += 1,
            Err(e) => {
                eprintln!("  Error storing silo '{}': {}", silo.name, e);
                report.errors += 1;
            }
        }
    }

    for id in fixture.excluded_targets {
        store.exclude_target(id)?;
    }
    for text in &fixture.excluded_anchors {
        store.exclude_anchor(text)?;
    }

    Ok(report)
}
