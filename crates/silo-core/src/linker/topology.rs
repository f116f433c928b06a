//! Edge planning per linking mode.
//!
//! Planning is pure: it sees only the hub, the ordered supports and the
//! normalised settings, and emits an ordered, duplicate-free edge list.
//! Relatedness for `ai_contextual` is supplied by the caller.

use crate::linker::Settings;
use crate::types::{LinkingMode, NodeId};
use std::collections::HashSet;

/// A directed edge to materialise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

/// Planned edges for one silo
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Mode actually used.
    pub mode: LinkingMode,
    /// Requested mode when a no-hub substitution happened.
    pub substituted_from: Option<LinkingMode>,
    pub edges: Vec<Edge>,
}

impl Plan {
    /// Keep edges whose source or target is in `nodes`
    pub fn restrict(&mut self, nodes: &HashSet<NodeId>) {
        self.edges
            .retain(|e| nodes.contains(&e.source) || nodes.contains(&e.target));
    }
}

/// Ordered edge accumulator. Drops self-edges and repeats.
#[derive(Default)]
struct EdgeList {
    edges: Vec<Edge>,
    seen: HashSet<Edge>,
}

impl EdgeList {
    fn push(&mut self, source: NodeId, target: NodeId) -> bool {
        let edge = Edge::new(source, target);
        if source == target || !self.seen.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }
}

/// Top related node ids for a node, drawn from a pool, at most `limit`
pub type RelatedFn<'a> = dyn FnMut(NodeId, &[NodeId], usize) -> Vec<NodeId> + 'a;

pub struct TopologyPlanner<'a> {
    hub: Option<NodeId>,
    supports: &'a [NodeId],
    settings: &'a Settings,
}

impl<'a> TopologyPlanner<'a> {
    /// `supports` must be in position order and must not contain the hub.
    pub fn new(hub: Option<NodeId>, supports: &'a [NodeId], settings: &'a Settings) -> Self {
        Self {
            hub,
            supports,
            settings,
        }
    }

    pub fn plan(&self, mode: LinkingMode, related: &mut RelatedFn<'_>) -> Plan {
        let mut substituted_from = None;
        let mode = match mode {
            LinkingMode::StarHub | LinkingMode::HubChain if self.hub.is_none() => {
                log::warn!("{} requires a hub; falling back to chained without hub", mode);
                substituted_from = Some(mode);
                LinkingMode::Chained
            }
            other => other,
        };

        let mut list = EdgeList::default();
        match mode {
            LinkingMode::Linear => self.linear(&mut list),
            LinkingMode::Chained => {
                self.adjacency(&mut list);
                self.hub_guarantees(&mut list, true);
            }
            LinkingMode::CrossLinking => self.cross_linking(&mut list),
            LinkingMode::StarHub => self.hub_guarantees(&mut list, true),
            LinkingMode::HubChain => {
                self.to_hub(&mut list);
                self.adjacency(&mut list);
                self.from_hub(&mut list, 0);
            }
            LinkingMode::AiContextual => self.contextual(&mut list, related),
            LinkingMode::Custom => self.custom(&mut list),
        }

        Plan {
            mode,
            substituted_from,
            edges: list.edges,
        }
    }

    /// Hub, then supports
    fn all_nodes(&self) -> Vec<NodeId> {
        self.hub.iter().chain(self.supports).copied().collect()
    }

    fn is_member(&self, node: NodeId) -> bool {
        self.hub == Some(node) || self.supports.contains(&node)
    }

    fn linear(&self, list: &mut EdgeList) {
        let mut hub_links = 0;
        if let (Some(hub), Some(&first)) = (self.hub, self.supports.first()) {
            list.push(hub, first);
            hub_links = 1;
        }
        for pair in self.supports.windows(2) {
            list.push(pair[0], pair[1]);
        }
        if self.hub.is_some() {
            self.to_hub(list);
            self.from_hub(list, hub_links);
        }
    }

    /// Bidirectional neighbour links, no wraparound
    fn adjacency(&self, list: &mut EdgeList) {
        let n = self.supports.len();
        for (i, &node) in self.supports.iter().enumerate() {
            if i + 1 < n {
                list.push(node, self.supports[i + 1]);
            }
            if i > 0 {
                list.push(node, self.supports[i - 1]);
            }
        }
    }

    fn cross_linking(&self, list: &mut EdgeList) {
        let nodes = self.all_nodes();
        let cap = self.settings.max_cross_links_per_post;
        for &source in &nodes {
            let mut out = 0;
            for &target in &nodes {
                if out >= cap {
                    break;
                }
                if source != target && list.push(source, target) {
                    out += 1;
                }
            }
        }
        self.hub_guarantees(list, true);
    }

    fn contextual(&self, list: &mut EdgeList, related: &mut RelatedFn<'_>) {
        let nodes = self.all_nodes();
        let k = self.settings.max_contextual_links;
        for &node in &nodes {
            let pool: Vec<NodeId> = nodes.iter().copied().filter(|&n| n != node).collect();
            let ranked = related(node, &pool, k);
            for target in ranked.into_iter().filter(|t| pool.contains(t)).take(k) {
                list.push(node, target);
            }
        }
        self.hub_guarantees(list, true);
    }

    fn custom(&self, list: &mut EdgeList) {
        for rule in &self.settings.custom_pattern {
            let (Some(source), Some(target)) =
                (rule.source.resolve(self.hub), rule.target.resolve(self.hub))
            else {
                log::debug!("Skipping custom rule {:?}: silo has no hub", rule);
                continue;
            };
            if !self.is_member(source) || !self.is_member(target) {
                log::debug!(
                    "Skipping custom rule {} -> {}: not a silo member",
                    source,
                    target
                );
                continue;
            }
            list.push(source, target);
        }
        self.hub_guarantees(list, false);
    }

    /// Support→hub and hub→support passes. With `defaults` false only
    /// flags present in the raw settings apply.
    fn hub_guarantees(&self, list: &mut EdgeList, defaults: bool) {
        let s = self.settings;
        if s.supports_to_hub && (defaults || s.supports_to_hub_explicit) {
            self.to_hub(list);
        }
        if s.hub_to_supports && (defaults || s.hub_to_supports_explicit) {
            self.from_hub(list, 0);
        }
    }

    fn to_hub(&self, list: &mut EdgeList) {
        if !self.settings.supports_to_hub {
            return;
        }
        if let Some(hub) = self.hub {
            for &support in self.supports {
                list.push(support, hub);
            }
        }
    }

    /// Hub→support edges up to `max_hub_links`, counting `already` toward the cap
    fn from_hub(&self, list: &mut EdgeList, already: usize) {
        if !self.settings.hub_to_supports {
            return;
        }
        let Some(hub) = self.hub else { return };
        let mut count = already;
        for &support in self.supports {
            if count >= self.settings.max_hub_links {
                break;
            }
            if list.push(hub, support) {
                count += 1;
            }
        }
    }
}
