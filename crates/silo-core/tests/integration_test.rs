use silo_core::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::tempdir;

fn article(id: NodeId, title: &str, body: &str) -> Node {
    Node::new(id, title, body).with_permalink(format!("/articles/{}", id))
}

fn garden_nodes() -> Vec<Node> {
    [
        (1, "Vegetable Gardening", "Start here."),
        (2, "Raised Beds", "Raised frames drain well."),
        (3, "Companion Planting", "Some plants help each other."),
        (4, "Composting Basics", "Compost feeds the soil."),
    ]
    .into_iter()
    .map(|(id, title, intro)| {
        article(
            id,
            title,
            &format!(
                "<p>{}</p>\n<p>See also: vegetable gardening, raised beds, companion \
                 planting and composting basics.</p>",
                intro
            ),
        )
    })
    .collect()
}

fn active_pairs(store: &RedbStore) -> HashSet<(NodeId, NodeId)> {
    store
        .list_links()
        .unwrap()
        .into_iter()
        .filter(|l| l.is_active())
        .map(|l| (l.source, l.target))
        .collect()
}

// ── Storage Persistence ──────────────────────────────────────────────────────

#[test]
fn test_storage_persistence() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    let silo_id = {
        let store = Arc::new(RedbStore::open(&db_path).unwrap());
        for node in garden_nodes() {
            store.put_node(&node).unwrap();
        }
        let silo = Silo::new("Garden", LinkingMode::Linear)
            .with_hub(1)
            .with_members(&[2, 3, 4]);
        store.put_silo(&silo).unwrap();

        let builder =
            LinkGraphBuilder::new(store.clone(), store.clone(), EngineConfig::default()).unwrap();
        assert_eq!(builder.generate(silo.id, None).unwrap(), 6);
        silo.id
    };

    // Reopen and verify silo, links and markers survived
    let store = RedbStore::open(&db_path).unwrap();
    let silo = store.get_silo(silo_id).unwrap().expect("silo should survive reopen");
    assert_eq!(silo.mode, LinkingMode::Linear);

    let stats = store.stats().unwrap();
    assert_eq!(stats.node_count, 4);
    assert_eq!(stats.active_links, 6);

    let links = store.get_links_from(2, Some(silo_id)).unwrap();
    assert_eq!(links.len(), 2);
    let body = store.get_body(2).unwrap();
    for link in &links {
        assert!(body.contains(&format!("<!-- silo-link:{} -->", link.id)));
        assert!(body.contains(&format!("href=\"/articles/{}\"", link.target)));
    }
}

// ── End-to-end Generation ────────────────────────────────────────────────────

#[test]
fn test_every_mode_keeps_invariants() {
    for mode in LinkingMode::all() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RedbStore::open(dir.path().join("test.redb")).unwrap());
        for node in garden_nodes() {
            store.put_node(&node).unwrap();
        }
        let settings = RawSettings::new()
            .with_hub_to_supports(true)
            .with_rule(RawEndpoint::Text("hub".into()), RawEndpoint::Id(3))
            .with_rule(RawEndpoint::Id(4), RawEndpoint::Id(2));
        let silo = Silo::new("Garden", mode)
            .with_hub(1)
            .with_members(&[2, 3, 4])
            .with_settings(settings);
        store.put_silo(&silo).unwrap();

        let builder =
            LinkGraphBuilder::new(store.clone(), store.clone(), EngineConfig::default()).unwrap();
        let metrics = builder.generate_with_report(silo.id, None).unwrap();
        assert!(metrics.edges_created > 0, "{} created nothing", mode);
        assert_eq!(
            metrics.edges_created + metrics.skipped_total(),
            metrics.edges_planned,
            "{} metrics do not add up",
            mode
        );

        let mut anchors = HashSet::new();
        let mutator = ContentMutator::new();
        for link in store.list_links().unwrap() {
            assert_ne!(link.source, link.target);
            assert!(
                anchors.insert(link.anchor_text.to_lowercase()),
                "{} reused anchor '{}'",
                mode,
                link.anchor_text
            );
            let body = store.get_body(link.source).unwrap();
            assert!(mutator.marker_ids(&body).contains(&link.id.to_string()));
        }

        // Second run is a no-op
        assert_eq!(builder.generate(silo.id, None).unwrap(), 0, "{} not idempotent", mode);
    }
}

#[test]
fn test_remove_restores_original_bodies() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("test.redb")).unwrap());
    let nodes = garden_nodes();
    for node in &nodes {
        store.put_node(node).unwrap();
    }
    let silo = Silo::new("Garden", LinkingMode::CrossLinking)
        .with_hub(1)
        .with_members(&[2, 3, 4]);
    store.put_silo(&silo).unwrap();

    let builder =
        LinkGraphBuilder::new(store.clone(), store.clone(), EngineConfig::default()).unwrap();
    builder.generate(silo.id, None).unwrap();
    let generated = active_pairs(&store);

    for node in &nodes {
        builder.remove_links(node.id, Some(silo.id)).unwrap();
        assert_eq!(store.get_body(node.id).unwrap(), node.body);
    }
    assert!(active_pairs(&store).is_empty());
    assert_eq!(store.stats().unwrap().removed_links, generated.len() as u64);

    builder.generate(silo.id, None).unwrap();
    assert_eq!(active_pairs(&store), generated);
}

#[test]
fn test_preview_matches_generation() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("test.redb")).unwrap());
    for node in garden_nodes() {
        store.put_node(&node).unwrap();
    }
    let silo = Silo::new("Garden", LinkingMode::HubChain)
        .with_hub(1)
        .with_members(&[2, 3, 4]);
    store.put_silo(&silo).unwrap();

    let builder =
        LinkGraphBuilder::new(store.clone(), store.clone(), EngineConfig::default()).unwrap();
    let preview = builder.preview(silo.id, None).unwrap();
    let proposed: HashSet<(NodeId, NodeId)> = preview
        .iter()
        .flat_map(|(source, entries)| entries.iter().map(move |e| (*source, e.target_id)))
        .collect();
    assert!(store.list_links().unwrap().is_empty());

    builder.generate(silo.id, None).unwrap();
    assert_eq!(active_pairs(&store), proposed);
}

// ── Suggester Layer ──────────────────────────────────────────────────────────

struct EchoSuggester;

impl Suggester for EchoSuggester {
    fn suggest_anchors(
        &self,
        _source: NodeId,
        target: NodeId,
        _context: Option<&str>,
    ) -> std::result::Result<Vec<String>, SuggesterError> {
        Ok(vec![format!("guide number {}", target)])
    }

    fn rank_relevant(
        &self,
        _hub: NodeId,
        _pool: &[NodeId],
        _limit: usize,
    ) -> std::result::Result<Vec<NodeId>, SuggesterError> {
        Err(SuggesterError::Unavailable)
    }
}

#[test]
fn test_suggested_anchor_falls_back_to_title_text() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("test.redb")).unwrap());
    for node in garden_nodes() {
        store.put_node(&node).unwrap();
    }
    let silo = Silo::new("Garden", LinkingMode::StarHub)
        .with_hub(1)
        .with_members(&[2, 3]);
    store.put_silo(&silo).unwrap();

    let config = EngineConfig::new().with_suggester(SuggesterConfig::default());
    let builder = LinkGraphBuilder::new(store.clone(), store.clone(), config)
        .unwrap()
        .with_suggester(Arc::new(EchoSuggester));
    assert_eq!(builder.generate(silo.id, None).unwrap(), 2);

    // The suggested phrase is recorded; the body wraps the hub title it found
    let link = &store.get_links_from(2, Some(silo.id)).unwrap()[0];
    assert_eq!(link.anchor_text, "guide number 1");
    assert!(store
        .get_body(2)
        .unwrap()
        .contains(">vegetable gardening</a>"));
}
