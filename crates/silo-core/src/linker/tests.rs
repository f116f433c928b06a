use super::*;
use crate::error::{Result, SiloError};
use crate::placement::{ContentMutator, WriteGuard};
use crate::storage::{ContentStore, RedbStore, Store};
use crate::suggester::{Suggester, SuggesterError};
use crate::types::{LinkingMode, Node, NodeId, PublishState, Silo, SiloId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

const H: NodeId = 10;
const A: NodeId = 11;
const B: NodeId = 12;
const C: NodeId = 13;

fn create_test_store() -> (Arc<RedbStore>, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.redb");
    let store = RedbStore::open(&db_path).unwrap();
    (Arc::new(store), temp_dir)
}

fn body_for(title: &str) -> String {
    format!(
        "<p>All about {}.</p>\n<p>Related reading: panel installation, battery storage, \
         inverter sizing and the solar energy hub.</p>",
        title
    )
}

fn solar_nodes() -> Vec<Node> {
    [
        (H, "Solar Energy Hub"),
        (A, "Panel Installation"),
        (B, "Battery Storage"),
        (C, "Inverter Sizing"),
    ]
    .into_iter()
    .map(|(id, title)| Node::new(id, title, body_for(title)).with_permalink(format!("/p/{}", id)))
    .collect()
}

fn seed(store: &RedbStore, nodes: &[Node]) {
    for node in nodes {
        store.put_node(node).unwrap();
    }
}

fn solar_silo(store: &RedbStore, mode: LinkingMode, settings: RawSettings) -> Silo {
    seed(store, &solar_nodes());
    let silo = Silo::new("Solar", mode)
        .with_hub(H)
        .with_members(&[A, B, C])
        .with_settings(settings);
    store.put_silo(&silo).unwrap();
    silo
}

fn builder(store: &Arc<RedbStore>) -> LinkGraphBuilder<RedbStore, RedbStore> {
    LinkGraphBuilder::new(store.clone(), store.clone(), EngineConfig::default()).unwrap()
}

fn active_pairs(store: &RedbStore, silo: SiloId) -> HashSet<(NodeId, NodeId)> {
    store
        .list_links()
        .unwrap()
        .into_iter()
        .filter(|l| l.is_active() && l.silo_id == silo)
        .map(|l| (l.source, l.target))
        .collect()
}

fn anchors_by_position(store: &RedbStore) -> Vec<String> {
    let mut links = store.list_links().unwrap();
    links.sort_by_key(|l| l.position);
    links.into_iter().map(|l| l.anchor_text).collect()
}

fn assert_invariants(store: &RedbStore) {
    let mut seen = HashSet::new();
    for link in store.list_links().unwrap().iter().filter(|l| l.is_active()) {
        assert_ne!(link.source, link.target, "self-link {:?}", link);
        assert!(
            seen.insert((link.silo_id, link.source, link.target)),
            "duplicate active link {:?}",
            link
        );
        let len = link.anchor_text.chars().count();
        assert!((1..=100).contains(&len));
        assert!(crate::anchor::has_content_token(&link.anchor_text));

        let body = store.get_body(link.source).unwrap();
        assert!(
            ContentMutator::new().marker_ids(&body).contains(&link.id.to_string()),
            "link {} has no marker in node {}",
            link.id,
            link.source
        );
    }
}

/// Content store that refuses writes to one node
struct FailingContent {
    inner: Arc<RedbStore>,
    fail_for: NodeId,
}

impl ContentStore for FailingContent {
    fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        self.inner.get_node(id)
    }

    fn set_body(&self, id: NodeId, body: &str) -> Result<()> {
        if id == self.fail_for {
            return Err(SiloError::ContentWrite {
                node: id,
                reason: "disk full".into(),
            });
        }
        self.inner.set_body(id, body)
    }
}

/// Content store that records whether the write lease was held
struct RecordingContent {
    inner: Arc<RedbStore>,
    guard: Arc<WriteGuard>,
    observed: Mutex<Vec<(NodeId, bool)>>,
}

impl ContentStore for RecordingContent {
    fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        self.inner.get_node(id)
    }

    fn set_body(&self, id: NodeId, body: &str) -> Result<()> {
        self.observed
            .lock()
            .unwrap()
            .push((id, self.guard.is_held(id)));
        self.inner.set_body(id, body)
    }
}

/// Ranks the pool in reverse; has no anchor suggestions
struct ReverseRanker;

impl Suggester for ReverseRanker {
    fn suggest_anchors(
        &self,
        _source: NodeId,
        _target: NodeId,
        _context: Option<&str>,
    ) -> std::result::Result<Vec<String>, SuggesterError> {
        Err(SuggesterError::Unavailable)
    }

    fn rank_relevant(
        &self,
        _hub: NodeId,
        pool: &[NodeId],
        _limit: usize,
    ) -> std::result::Result<Vec<NodeId>, SuggesterError> {
        Ok(pool.iter().rev().copied().collect())
    }
}

/// Suggester that counts how often it is reached and never answers
struct CountingSuggester {
    calls: AtomicU32,
}

impl Suggester for CountingSuggester {
    fn suggest_anchors(
        &self,
        _source: NodeId,
        _target: NodeId,
        _context: Option<&str>,
    ) -> std::result::Result<Vec<String>, SuggesterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SuggesterError::Unavailable)
    }

    fn rank_relevant(
        &self,
        _hub: NodeId,
        _pool: &[NodeId],
        _limit: usize,
    ) -> std::result::Result<Vec<NodeId>, SuggesterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SuggesterError::Unavailable)
    }
}

#[test]
fn test_linear_scenario() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());

    let metrics = builder(&store).generate_with_report(silo.id, None).unwrap();

    assert_eq!(metrics.mode, Some(LinkingMode::Linear));
    assert_eq!(metrics.edges_planned, 6);
    assert_eq!(metrics.edges_created, 6);
    assert_eq!(
        active_pairs(&store, silo.id),
        HashSet::from([(H, A), (A, B), (B, C), (A, H), (B, H), (C, H)])
    );
    assert_invariants(&store);
}

#[test]
fn test_cross_linking_scenario() {
    let (store, _temp) = create_test_store();
    seed(&store, &solar_nodes());
    let silo = Silo::new("Solar", LinkingMode::CrossLinking)
        .with_hub(H)
        .with_members(&[A, B]);
    store.put_silo(&silo).unwrap();

    assert_eq!(builder(&store).generate(silo.id, None).unwrap(), 6);
    assert_eq!(
        active_pairs(&store, silo.id),
        HashSet::from([(H, A), (H, B), (A, H), (A, B), (B, H), (B, A)])
    );
    assert_invariants(&store);
}

#[test]
fn test_custom_pattern_scenario() {
    let (store, _temp) = create_test_store();
    seed(&store, &solar_nodes());
    let settings = RawSettings::new()
        .with_rule(RawEndpoint::Text("hub".into()), RawEndpoint::Id(A))
        .with_rule(RawEndpoint::Id(B), RawEndpoint::Id(999));
    let silo = Silo::new("Solar", LinkingMode::Custom)
        .with_hub(H)
        .with_members(&[A, B])
        .with_settings(settings);
    store.put_silo(&silo).unwrap();

    assert_eq!(builder(&store).generate(silo.id, None).unwrap(), 1);
    assert_eq!(active_pairs(&store, silo.id), HashSet::from([(H, A)]));
}

#[test]
fn test_star_hub_without_hub_uses_chained() {
    let (store, _temp) = create_test_store();
    seed(&store, &solar_nodes());
    let silo = Silo::new("Solar", LinkingMode::StarHub).with_members(&[A, B, C]);
    store.put_silo(&silo).unwrap();

    let metrics = builder(&store).generate_with_report(silo.id, None).unwrap();
    assert_eq!(metrics.mode, Some(LinkingMode::Chained));
    assert_eq!(
        active_pairs(&store, silo.id),
        HashSet::from([(A, B), (B, A), (B, C), (C, B)])
    );
}

#[test]
fn test_truthy_settings() {
    let (store, _temp) = create_test_store();
    let settings: RawSettings = serde_json::from_str(
        r#"{"supports_to_hub": "0", "hub_to_supports": 1, "max_hub_links": "2"}"#,
    )
    .unwrap();
    let silo = solar_silo(&store, LinkingMode::StarHub, settings);

    assert_eq!(builder(&store).generate(silo.id, None).unwrap(), 2);
    assert_eq!(active_pairs(&store, silo.id), HashSet::from([(H, A), (H, B)]));
}

#[test]
fn test_dedup_prefers_alternative() {
    let (store, _temp) = create_test_store();
    seed(
        &store,
        &[
            Node::new(H, "Guide", "Hub text."),
            Node::new(A, "Alpha Notes", "Read the Guide first."),
            Node::new(B, "Beta Notes", "The Guide helps."),
        ],
    );
    let silo = Silo::new("Guides", LinkingMode::StarHub)
        .with_hub(H)
        .with_members(&[A, B]);
    store.put_silo(&silo).unwrap();

    assert_eq!(builder(&store).generate(silo.id, None).unwrap(), 2);

    let anchors = anchors_by_position(&store);
    assert_eq!(anchors[0], "Guide");
    assert_ne!(anchors[1].to_lowercase(), "guide");
    assert_invariants(&store);
}

#[test]
fn test_dedup_numeric_suffix() {
    let (store, _temp) = create_test_store();
    seed(
        &store,
        &[
            Node::new(H, "Guide", "Hub text."),
            Node::new(A, "Alpha Notes", "Read the Guide first."),
            Node::new(B, "Beta Notes", "The Guide helps."),
        ],
    );
    let silo = Silo::new("Guides", LinkingMode::StarHub)
        .with_hub(H)
        .with_members(&[A, B]);
    store.put_silo(&silo).unwrap();

    let config = EngineConfig::new().with_anchor(AnchorConfig::new().with_max_alternatives(0));
    let builder = LinkGraphBuilder::new(store.clone(), store.clone(), config).unwrap();
    let metrics = builder.generate_with_report(silo.id, None).unwrap();
    assert_eq!(metrics.suffixed_anchors, 1);

    let anchors = anchors_by_position(&store);
    assert_eq!(anchors, vec!["Guide", "Guide 2"]);
    // The body wraps the text that was actually found
    assert!(store.get_body(B).unwrap().contains(">Guide</a>"));
}

#[test]
fn test_generate_is_idempotent() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let builder = builder(&store);

    assert_eq!(builder.generate(silo.id, None).unwrap(), 6);
    let bodies: Vec<String> = [H, A, B, C].iter().map(|id| store.get_body(*id).unwrap()).collect();

    let metrics = builder.generate_with_report(silo.id, None).unwrap();
    assert_eq!(metrics.edges_created, 0);
    assert_eq!(metrics.skipped_for(SkipReason::AlreadyLinked), 6);
    assert_eq!(active_pairs(&store, silo.id).len(), 6);

    let after: Vec<String> = [H, A, B, C].iter().map(|id| store.get_body(*id).unwrap()).collect();
    assert_eq!(bodies, after);
}

#[test]
fn test_remove_and_regenerate_round_trip() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::HubChain, RawSettings::new().with_hub_to_supports(true));
    let builder = builder(&store);
    let originals: Vec<String> = solar_nodes().into_iter().map(|n| n.body).collect();

    builder.generate(silo.id, None).unwrap();
    let first = active_pairs(&store, silo.id);
    assert!(!first.is_empty());

    for id in [H, A, B, C] {
        builder.remove_links(id, None).unwrap();
    }
    assert!(active_pairs(&store, silo.id).is_empty());
    let restored: Vec<String> = [H, A, B, C].iter().map(|id| store.get_body(*id).unwrap()).collect();
    assert_eq!(restored, originals);

    builder.generate(silo.id, None).unwrap();
    assert_eq!(active_pairs(&store, silo.id), first);
    assert_invariants(&store);
}

#[test]
fn test_remove_restores_body_when_permalink_has_angle_brackets() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let hub = store.get_node(H).unwrap().unwrap().with_permalink("/hub?a>b<c");
    store.put_node(&hub).unwrap();
    let builder = builder(&store);
    let original = store.get_body(A).unwrap();

    builder.generate(silo.id, None).unwrap();
    assert!(active_pairs(&store, silo.id).contains(&(A, H)));
    assert!(store.get_body(A).unwrap().contains("/hub?a&gt;b&lt;c"));
    assert_invariants(&store);

    assert!(builder.remove_links(A, None).unwrap());
    assert_eq!(store.get_body(A).unwrap(), original);
}

#[test]
fn test_suggester_ceiling_applies_to_generation() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let counting = Arc::new(CountingSuggester {
        calls: AtomicU32::new(0),
    });
    let config = EngineConfig::new()
        .with_suggester(SuggesterConfig::new().with_max_requests_per_hour(1));
    let builder = LinkGraphBuilder::new(store.clone(), store.clone(), config)
        .unwrap()
        .with_suggester(counting.clone());

    let metrics = builder.generate_with_report(silo.id, None).unwrap();

    // Heuristics cover every edge once the ceiling is reached
    assert_eq!(metrics.edges_created, 6);
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert_invariants(&store);
}

#[test]
fn test_remove_without_markers_still_marks_records() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let builder = builder(&store);
    builder.generate(silo.id, None).unwrap();

    // Body edited externally, markers gone
    store.set_body(A, "Rewritten by an editor.").unwrap();
    assert!(builder.remove_links(A, Some(silo.id)).unwrap());
    assert!(store.get_links_from(A, None).unwrap().is_empty());

    assert!(!builder.remove_links(A, Some(silo.id)).unwrap());
}

#[test]
fn test_remove_scoped_to_silo() {
    let (store, _temp) = create_test_store();
    let linear = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let pair = Silo::new("Pair", LinkingMode::Chained).with_members(&[A, C]);
    store.put_silo(&pair).unwrap();

    let builder = builder(&store);
    builder.generate(linear.id, None).unwrap();
    builder.generate(pair.id, None).unwrap();
    assert_eq!(ContentMutator::new().marker_ids(&store.get_body(A).unwrap()).len(), 3);

    assert!(builder.remove_links(A, Some(pair.id)).unwrap());
    assert_eq!(ContentMutator::new().marker_ids(&store.get_body(A).unwrap()).len(), 2);
    assert_eq!(store.get_links_from(A, Some(linear.id)).unwrap().len(), 2);
    assert!(store.get_links_from(A, Some(pair.id)).unwrap().is_empty());
    assert_invariants(&store);
}

#[test]
fn test_failed_body_write_rolls_back() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let content = Arc::new(FailingContent {
        inner: store.clone(),
        fail_for: B,
    });
    let builder = LinkGraphBuilder::new(store.clone(), content, EngineConfig::default()).unwrap();

    let metrics = builder.generate_with_report(silo.id, None).unwrap();
    assert_eq!(metrics.edges_created, 4);
    assert_eq!(metrics.rollbacks, 2);
    assert_eq!(metrics.skipped_for(SkipReason::PersistFailure), 2);

    assert!(store.list_links().unwrap().iter().all(|l| l.source != B));
    assert_eq!(store.get_body(B).unwrap(), body_for("Battery Storage"));
    assert_invariants(&store);
}

#[test]
fn test_no_attachable_text_leaves_no_record() {
    let (store, _temp) = create_test_store();
    seed(
        &store,
        &[
            Node::new(H, "Quantum Widgets", ""),
            Node::new(A, "Alpha", "Nothing in common here."),
        ],
    );
    let silo = Silo::new("Odd", LinkingMode::StarHub).with_hub(H).with_members(&[A]);
    store.put_silo(&silo).unwrap();

    let metrics = builder(&store).generate_with_report(silo.id, None).unwrap();
    assert_eq!(metrics.edges_created, 0);
    assert_eq!(metrics.skipped_for(SkipReason::NoAttachableText), 1);
    assert!(store.list_links().unwrap().is_empty());
    assert_eq!(store.get_body(A).unwrap(), "Nothing in common here.");
}

#[test]
fn test_unpublished_and_excluded_targets_skipped() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let draft = Node::new(B, "Battery Storage", body_for("Battery Storage"))
        .with_publish_state(PublishState::Draft);
    store.put_node(&draft).unwrap();
    store.exclude_target(H).unwrap();

    let metrics = builder(&store).generate_with_report(silo.id, None).unwrap();
    // A→B, B→C and B→H touch the draft; A→H and C→H target the excluded hub
    assert_eq!(metrics.skipped_for(SkipReason::Unpublished), 3);
    assert_eq!(metrics.skipped_for(SkipReason::ExcludedTarget), 2);
    assert_eq!(active_pairs(&store, silo.id), HashSet::from([(H, A)]));
}

#[test]
fn test_excluded_anchor_avoided() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    store.exclude_anchor("Panel  Installation").unwrap();

    builder(&store).generate(silo.id, None).unwrap();

    let link = store
        .get_links_from(H, Some(silo.id))
        .unwrap()
        .into_iter()
        .find(|l| l.target == A)
        .unwrap();
    assert_ne!(link.anchor_text.to_lowercase(), "panel installation");
    assert_invariants(&store);
}

#[test]
fn test_write_lease_held_during_body_write() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let guard = Arc::new(WriteGuard::new());
    let content = Arc::new(RecordingContent {
        inner: store.clone(),
        guard: guard.clone(),
        observed: Mutex::new(Vec::new()),
    });
    let builder = LinkGraphBuilder::new(store.clone(), content.clone(), EngineConfig::default())
        .unwrap()
        .with_guard(guard.clone());

    builder.generate(silo.id, None).unwrap();

    let observed = content.observed.lock().unwrap();
    assert_eq!(observed.len(), 6);
    assert!(observed.iter().all(|(_, held)| *held));
    assert!(!guard.is_held(A));
}

#[test]
fn test_save_notification_ignored_while_leased() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());
    let builder = builder(&store);
    builder.generate(silo.id, None).unwrap();
    builder.remove_links(A, None).unwrap();

    {
        let _lease = builder.guard().acquire(A).unwrap();
        assert_eq!(builder.handle_content_saved(A).unwrap(), 0);
    }

    // A's outgoing links come back; H→A is still active
    assert_eq!(builder.handle_content_saved(A).unwrap(), 2);
    assert_eq!(active_pairs(&store, silo.id).len(), 6);
}

#[test]
fn test_preview_does_not_mutate() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());

    let preview = builder(&store).preview(silo.id, None).unwrap();

    assert_eq!(preview.values().map(Vec::len).sum::<usize>(), 6);
    assert_eq!(preview[&A].len(), 2);
    let to_b = preview[&A].iter().find(|e| e.target_id == B).unwrap();
    assert_eq!(to_b.target_title, "Battery Storage");
    assert_eq!(to_b.anchor_text, "battery storage");
    assert!(to_b.anchor_variations.len() <= 3);
    assert_eq!(
        to_b.insertion_offset,
        body_for("Panel Installation").find("battery storage").unwrap()
    );

    assert!(store.list_links().unwrap().is_empty());
    assert_eq!(store.get_body(A).unwrap(), body_for("Panel Installation"));
}

#[test]
fn test_restricted_generation() {
    let (store, _temp) = create_test_store();
    let silo = solar_silo(&store, LinkingMode::Linear, RawSettings::new());

    assert_eq!(builder(&store).generate(silo.id, Some(&[C][..])).unwrap(), 2);
    assert_eq!(active_pairs(&store, silo.id), HashSet::from([(B, C), (C, H)]));
}

#[test]
fn test_ai_contextual_with_ranking_suggester() {
    let (store, _temp) = create_test_store();
    seed(&store, &solar_nodes());
    let silo = Silo::new("Solar", LinkingMode::AiContextual)
        .with_hub(H)
        .with_members(&[A, B])
        .with_settings(RawSettings::new().with_max_contextual_links(1));
    store.put_silo(&silo).unwrap();

    let builder = builder(&store).with_suggester(Arc::new(ReverseRanker));
    builder.generate(silo.id, None).unwrap();

    assert_eq!(
        active_pairs(&store, silo.id),
        HashSet::from([(H, B), (A, B), (B, A), (A, H), (B, H)])
    );
    assert_invariants(&store);
}

#[test]
fn test_ai_contextual_lexical_fallback() {
    let (store, _temp) = create_test_store();
    seed(&store, &solar_nodes());
    let silo = Silo::new("Solar", LinkingMode::AiContextual)
        .with_hub(H)
        .with_members(&[A, B, C]);
    store.put_silo(&silo).unwrap();

    let metrics = builder(&store).generate_with_report(silo.id, None).unwrap();

    // Shared bodies make every pair related; supports also link to the hub
    let pairs = active_pairs(&store, silo.id);
    assert!(pairs.contains(&(A, H)) && pairs.contains(&(B, H)) && pairs.contains(&(C, H)));
    assert!(metrics.edges_created >= 3);
    assert_invariants(&store);
}

#[test]
fn test_missing_silo_and_node_abort() {
    let (store, _temp) = create_test_store();
    let builder = builder(&store);

    let err = builder.generate(Uuid::now_v7(), None).unwrap_err();
    assert!(matches!(err, SiloError::SiloNotFound(_)));

    seed(&store, &solar_nodes());
    let silo = Silo::new("Broken", LinkingMode::Chained).with_members(&[A, 999]);
    store.put_silo(&silo).unwrap();
    let err = builder.generate(silo.id, None).unwrap_err();
    assert!(matches!(err, SiloError::NodeNotFound(999)));
    assert!(err.is_not_found());
}
