use crate::text;
use crate::types::{Node, NodeId};
use std::collections::HashSet;

/// Minimum score a neighbour needs to be linked in `ai_contextual` mode.
pub const MIN_RELATEDNESS: f32 = 0.1;

/// Weights of the lexical relatedness blend.
///
/// # Formula
/// ```text
/// score = min(1.0, title_w    × jaccard(title terms)
///                + content_w  × jaccard(content keywords)
///                + category_w × jaccard(categories)
///                + hub_bonus  if either node is the silo hub)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RelatednessWeights {
    pub title: f32,
    pub content: f32,
    pub category: f32,
    pub hub_bonus: f32,
}

impl Default for RelatednessWeights {
    fn default() -> Self {
        Self {
            title: 0.3,
            content: 0.4,
            category: 0.2,
            hub_bonus: 0.1,
        }
    }
}

/// Pre-tokenised view of a node, built once per run
#[derive(Debug, Clone)]
pub struct NodeFeatures {
    pub id: NodeId,
    title_terms: HashSet<String>,
    keywords: HashSet<String>,
    categories: HashSet<String>,
}

impl NodeFeatures {
    pub fn of(node: &Node) -> Self {
        Self {
            id: node.id,
            title_terms: text::title_terms(&node.title),
            keywords: text::keyword_set(&text::strip_markup(&node.body)),
            categories: node
                .categories
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

/// Lexical similarity between two documents. Not semantic: overlap of
/// title terms, content keywords and taxonomy categories.
#[derive(Debug, Clone, Default)]
pub struct RelatednessScorer {
    weights: RelatednessWeights,
}

impl RelatednessScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score two nodes in [0, 1]
    pub fn score(&self, a: &Node, b: &Node, hub: Option<NodeId>) -> f32 {
        self.score_features(&NodeFeatures::of(a), &NodeFeatures::of(b), hub)
    }

    pub fn score_features(&self, a: &NodeFeatures, b: &NodeFeatures, hub: Option<NodeId>) -> f32 {
        let w = &self.weights;
        let mut score = w.title * jaccard(&a.title_terms, &b.title_terms)
            + w.content * jaccard(&a.keywords, &b.keywords)
            + w.category * jaccard(&a.categories, &b.categories);

        if hub.is_some() && (hub == Some(a.id) || hub == Some(b.id)) {
            score += w.hub_bonus;
        }

        score.min(1.0)
    }

    /// Top-`k` neighbours of `node` from `pool`, descending by score,
    /// keeping only scores above [`MIN_RELATEDNESS`]. Ties keep pool order.
    pub fn top_related(
        &self,
        node: &NodeFeatures,
        pool: &[NodeFeatures],
        k: usize,
        hub: Option<NodeId>,
    ) -> Vec<(NodeId, f32)> {
        let mut scored: Vec<(NodeId, f32)> = pool
            .iter()
            .filter(|other| other.id != node.id)
            .map(|other| (other.id, self.score_features(node, other, hub)))
            .filter(|(_, score)| *score > MIN_RELATEDNESS)
            .collect();

        // sort_by is stable, so equal scores stay in pool order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();

    intersection as f32 / union as f32
}
