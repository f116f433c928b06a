use crate::anchor::AnchorTextSelector;
use crate::error::{Result, SiloError};
use crate::linker::{
    Edge, EngineConfig, Plan, RunContext, RunMetrics, Settings, SkipReason, TopologyPlanner,
};
use crate::placement::{ContentMutator, InsertionPointLocator, RemovalScope, WriteGuard};
use crate::scoring::{NodeFeatures, RelatednessScorer};
use crate::storage::{ContentStore, Store};
use crate::suggester::{CachedSuggester, Suggester};
use crate::types::{Link, LinkingMode, Node, NodeId, Silo, SiloId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// One proposed link in a preview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewEntry {
    pub target_id: NodeId,
    pub target_title: String,
    pub anchor_text: String,
    pub anchor_variations: Vec<String>,
    pub insertion_offset: usize,
}

/// Preview result: proposed links keyed by source node
pub type Preview = BTreeMap<NodeId, Vec<PreviewEntry>>;

/// Everything a run needs about one silo, loaded up front
struct SiloSnapshot {
    silo: Silo,
    settings: Settings,
    hub: Option<NodeId>,
    supports: Vec<NodeId>,
    nodes: HashMap<NodeId, Node>,
}

/// Orchestrates link generation for a silo.
///
/// Plans edges for the silo's linking mode, then materialises each edge
/// independently: anchor selection, insertion point, body write and link
/// record. A failing edge is skipped and counted; it never aborts the run.
pub struct LinkGraphBuilder<S: Store, C: ContentStore> {
    store: Arc<S>,
    content: Arc<C>,
    suggester: Option<Arc<dyn Suggester>>,
    selector: AnchorTextSelector,
    locator: InsertionPointLocator,
    mutator: ContentMutator,
    scorer: RelatednessScorer,
    guard: Arc<WriteGuard>,
    config: EngineConfig,
}

impl<S: Store, C: ContentStore> LinkGraphBuilder<S, C> {
    pub fn new(store: Arc<S>, content: Arc<C>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store,
            content,
            suggester: None,
            selector: AnchorTextSelector::new(config.anchor.clone()),
            locator: InsertionPointLocator::new(),
            mutator: ContentMutator::new(),
            scorer: RelatednessScorer::new(),
            guard: Arc::new(WriteGuard::new()),
            config,
        })
    }

    /// Use an external suggester for anchors and `ai_contextual` ranking.
    /// Calls go through the configured cache and hourly ceiling.
    pub fn with_suggester(mut self, suggester: Arc<dyn Suggester>) -> Self {
        let suggester: Arc<dyn Suggester> = Arc::new(CachedSuggester::new(
            suggester,
            self.config.suggester.clone(),
        ));
        self.selector = AnchorTextSelector::new(self.config.anchor.clone())
            .with_suggester(suggester.clone());
        self.suggester = Some(suggester);
        self
    }

    /// Share a write guard with the hosting system's save hook
    pub fn with_guard(mut self, guard: Arc<WriteGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &Arc<WriteGuard> {
        &self.guard
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate links for a silo. Returns the number of edges created.
    pub fn generate(&self, silo_id: SiloId, restrict: Option<&[NodeId]>) -> Result<u64> {
        Ok(self.generate_with_report(silo_id, restrict)?.edges_created)
    }

    /// Generate links and return the full run metrics
    pub fn generate_with_report(
        &self,
        silo_id: SiloId,
        restrict: Option<&[NodeId]>,
    ) -> Result<RunMetrics> {
        let start = Instant::now();
        let mut snapshot = self.load(silo_id)?;
        let mut ctx = RunContext::new();
        let plan = self.plan(&snapshot, restrict, &mut ctx);

        ctx.metrics.mode = Some(plan.mode);
        ctx.metrics.edges_planned = plan.edges.len() as u64;

        for (position, edge) in plan.edges.iter().enumerate() {
            match self.create_edge(&mut snapshot, *edge, position as u32, &mut ctx) {
                Ok(link) => {
                    ctx.metrics.edges_created += 1;
                    log::debug!(
                        "Linked {} -> {} with '{}'",
                        link.source,
                        link.target,
                        link.anchor_text
                    );
                }
                Err(reason) => {
                    ctx.metrics.record_skip(reason);
                    log::debug!(
                        "Skipped {} -> {} in silo {}: {}",
                        edge.source,
                        edge.target,
                        silo_id,
                        reason
                    );
                }
            }
        }

        ctx.metrics.duration = start.elapsed();
        log::info!("Silo '{}': {}", snapshot.silo.name, ctx.metrics.summary());
        Ok(ctx.metrics)
    }

    /// Proposed links without touching bodies or the store
    pub fn preview(&self, silo_id: SiloId, restrict: Option<&[NodeId]>) -> Result<Preview> {
        let snapshot = self.load(silo_id)?;
        let mut ctx = RunContext::new();
        let plan = self.plan(&snapshot, restrict, &mut ctx);
        let admissible = |text: &str| self.anchor_admissible(text);

        let mut preview = Preview::new();
        for edge in &plan.edges {
            let (source, target) = match self.check_edge(&snapshot, *edge) {
                Ok(pair) => pair,
                Err(reason) => {
                    log::debug!("Preview skips {} -> {}: {}", edge.source, edge.target, reason);
                    continue;
                }
            };

            let variations = self.config.anchor.preview_variations;
            let Some(choice) = self.selector.choose(source, target, &mut ctx, &admissible, variations)
            else {
                continue;
            };

            preview.entry(edge.source).or_default().push(PreviewEntry {
                target_id: target.id,
                target_title: target.title.clone(),
                insertion_offset: self.locator.locate(&source.body, &choice.text),
                anchor_text: choice.text,
                anchor_variations: choice.variations,
            });
        }

        Ok(preview)
    }

    /// Remove generated links from a node's body and mark their records
    /// removed. With a silo only that silo's links are unwrapped, otherwise
    /// every marker in the body.
    ///
    /// Returns false when nothing changed or the node is being written by
    /// the engine itself.
    pub fn remove_links(&self, node_id: NodeId, silo_id: Option<SiloId>) -> Result<bool> {
        let node = self
            .content
            .get_node(node_id)?
            .ok_or(SiloError::NodeNotFound(node_id))?;

        let (body, unwrapped) = match silo_id {
            None => self.mutator.remove(&node.body, RemovalScope::All),
            Some(silo) => {
                let mut body = node.body.clone();
                let mut unwrapped = 0;
                for link in self.store.get_links_from(node_id, Some(silo))? {
                    let (next, n) = self.mutator.remove(&body, RemovalScope::Link(link.id));
                    body = next;
                    unwrapped += n;
                }
                (body, unwrapped)
            }
        };

        if unwrapped > 0 {
            let Some(_lease) = self.guard.acquire(node_id) else {
                log::debug!("Node {} is being written, not removing links", node_id);
                return Ok(false);
            };
            self.content.set_body(node_id, &body)?;
        }

        let marked = self.store.mark_removed(node_id, silo_id)?;
        log::info!(
            "Removed links from node {}: {} markers unwrapped, {} records marked removed",
            node_id,
            unwrapped,
            marked
        );
        Ok(unwrapped > 0 || marked > 0)
    }

    /// Entry point for the hosting system's save notification.
    ///
    /// Ignored while the engine itself holds the node's write lease.
    /// Otherwise every silo containing the node is regenerated, restricted
    /// to edges touching the node.
    pub fn handle_content_saved(&self, node_id: NodeId) -> Result<u64> {
        if self.guard.is_held(node_id) {
            log::debug!("Ignoring save of node {}: engine write in progress", node_id);
            return Ok(0);
        }

        let mut created = 0;
        for silo in self.store.list_silos()? {
            if silo.contains(node_id) {
                created += self.generate(silo.id, Some(std::slice::from_ref(&node_id)))?;
            }
        }
        Ok(created)
    }

    fn load(&self, silo_id: SiloId) -> Result<SiloSnapshot> {
        let silo = self
            .store
            .get_silo(silo_id)?
            .ok_or(SiloError::SiloNotFound(silo_id))?;
        let settings = silo.settings.normalize();
        let hub = silo.hub;

        let supports: Vec<NodeId> = self
            .store
            .get_members(silo_id)?
            .into_iter()
            .map(|m| m.node_id)
            .filter(|id| Some(*id) != hub)
            .collect();

        let mut nodes = HashMap::new();
        for id in hub.iter().chain(&supports) {
            let node = self
                .content
                .get_node(*id)?
                .ok_or(SiloError::NodeNotFound(*id))?;
            nodes.insert(*id, node);
        }

        Ok(SiloSnapshot {
            silo,
            settings,
            hub,
            supports,
            nodes,
        })
    }

    fn plan(
        &self,
        snapshot: &SiloSnapshot,
        restrict: Option<&[NodeId]>,
        ctx: &mut RunContext,
    ) -> Plan {
        let planner = TopologyPlanner::new(snapshot.hub, &snapshot.supports, &snapshot.settings);

        let mut plan = if snapshot.silo.mode == LinkingMode::AiContextual {
            let features: Vec<NodeFeatures> = snapshot
                .hub
                .iter()
                .chain(&snapshot.supports)
                .filter_map(|id| snapshot.nodes.get(id))
                .map(NodeFeatures::of)
                .collect();
            let mut fallbacks = 0;
            let mut related = |node: NodeId, pool: &[NodeId], limit: usize| {
                if let Some(ranked) = self.rank_with_suggester(node, pool, limit) {
                    return ranked;
                }
                fallbacks += 1;
                let Some(own) = features.iter().find(|f| f.id == node) else {
                    return Vec::new();
                };
                self.scorer
                    .top_related(own, &features, limit, snapshot.hub)
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect()
            };
            let plan = planner.plan(snapshot.silo.mode, &mut related);
            if self.suggester.is_some() {
                ctx.metrics.suggester_fallbacks += fallbacks;
            }
            plan
        } else {
            planner.plan(snapshot.silo.mode, &mut |_, _, _| Vec::new())
        };

        if let Some(ids) = restrict {
            plan.restrict(&ids.iter().copied().collect::<HashSet<_>>());
        }
        plan
    }

    /// Suggester ranking filtered to the pool. `None` to fall back to scoring.
    fn rank_with_suggester(&self, node: NodeId, pool: &[NodeId], limit: usize) -> Option<Vec<NodeId>> {
        let suggester = self.suggester.as_ref()?;
        match suggester.rank_relevant(node, pool, limit) {
            Ok(ranked) => {
                let mut seen = HashSet::new();
                let ranked: Vec<NodeId> = ranked
                    .into_iter()
                    .filter(|id| pool.contains(id) && seen.insert(*id))
                    .take(limit)
                    .collect();
                (!ranked.is_empty()).then_some(ranked)
            }
            Err(e) => {
                log::debug!("Ranking for node {} falls back to lexical scoring: {}", node, e);
                None
            }
        }
    }

    /// Preconditions shared by generation and preview
    fn check_edge<'s>(
        &self,
        snapshot: &'s SiloSnapshot,
        edge: Edge,
    ) -> std::result::Result<(&'s Node, &'s Node), SkipReason> {
        if edge.source == edge.target {
            return Err(SkipReason::SelfLink);
        }
        let (Some(source), Some(target)) = (
            snapshot.nodes.get(&edge.source),
            snapshot.nodes.get(&edge.target),
        ) else {
            return Err(SkipReason::NodeMissing);
        };
        if !source.is_published() || !target.is_published() {
            return Err(SkipReason::Unpublished);
        }

        let excluded = self.store.is_excluded_target(edge.target).map_err(|e| {
            log::warn!("Exclusion lookup for node {} failed: {}", edge.target, e);
            SkipReason::PersistFailure
        })?;
        if excluded {
            return Err(SkipReason::ExcludedTarget);
        }

        let linked = self
            .store
            .has_active_link(snapshot.silo.id, edge.source, edge.target)
            .map_err(|e| {
                log::warn!("Link lookup for {} -> {} failed: {}", edge.source, edge.target, e);
                SkipReason::PersistFailure
            })?;
        if linked {
            return Err(SkipReason::AlreadyLinked);
        }

        Ok((source, target))
    }

    /// Excluded anchors and, when configured, site-wide reuse limits
    fn anchor_admissible(&self, text: &str) -> bool {
        match self.store.is_excluded_anchor(text) {
            Ok(true) => return false,
            Ok(false) => {}
            Err(e) => {
                log::warn!("Anchor exclusion lookup failed for '{}': {}", text, e);
                return false;
            }
        }

        let max_reuse = self.config.anchor.max_anchor_reuse;
        if max_reuse == 0 {
            return true;
        }
        match self.store.anchor_usage_count(text) {
            Ok(used) => used < max_reuse,
            Err(e) => {
                log::warn!("Anchor usage lookup failed for '{}': {}", text, e);
                false
            }
        }
    }

    /// Materialise one edge. The link record and the body marker are
    /// written together; a failed body write deletes the record again.
    fn create_edge(
        &self,
        snapshot: &mut SiloSnapshot,
        edge: Edge,
        position: u32,
        ctx: &mut RunContext,
    ) -> std::result::Result<Link, SkipReason> {
        let (source, target) = self.check_edge(snapshot, edge)?;

        let admissible = |text: &str| self.anchor_admissible(text);
        let anchor = self
            .selector
            .select(source, target, ctx, &admissible)
            .ok_or(SkipReason::NoAnchor)?;

        let offset = self.locator.locate(&source.body, &anchor);
        let mut link = Link::new(snapshot.silo.id, edge.source, edge.target, &anchor, offset, position);
        if let Err(reason) = link.validate() {
            log::warn!("Rejected anchor '{}': {}", anchor, reason);
            ctx.release(&anchor);
            return Err(SkipReason::NoAnchor);
        }

        let insertion = match self.mutator.insert(source, target, &link) {
            Ok(insertion) => insertion,
            Err(e) => {
                ctx.release(&anchor);
                return Err(match e {
                    SiloError::NoAttachableText { .. } => SkipReason::NoAttachableText,
                    SiloError::InvalidState(_) => SkipReason::Unpublished,
                    _ => SkipReason::PersistFailure,
                });
            }
        };
        link.placement = insertion.placement;

        if let Err(e) = self.store.create_link(&link) {
            ctx.release(&anchor);
            return Err(match e {
                SiloError::DuplicateLink { .. } => SkipReason::AlreadyLinked,
                other => {
                    log::warn!("Persisting link {} -> {} failed: {}", edge.source, edge.target, other);
                    SkipReason::PersistFailure
                }
            });
        }

        let written = match self.guard.acquire(edge.source) {
            Some(_lease) => self.content.set_body(edge.source, &insertion.body),
            None => Err(SiloError::InvalidState(format!(
                "node {} is already being written",
                edge.source
            ))),
        };
        if let Err(e) = written {
            log::warn!(
                "Body write for node {} failed, rolling back link {}: {}",
                edge.source,
                link.id,
                e
            );
            if let Err(e) = self.store.delete_link(link.id) {
                log::error!("Rollback of link {} failed: {}", link.id, e);
            }
            ctx.metrics.rollbacks += 1;
            ctx.release(&anchor);
            return Err(SkipReason::PersistFailure);
        }

        if let Some(node) = snapshot.nodes.get_mut(&edge.source) {
            node.body = insertion.body;
        }
        Ok(link)
    }
}
