//! Seam to the external text-suggestion service.
//!
//! The engine never talks HTTP itself. Callers inject an implementation of
//! [`Suggester`]; [`CachedSuggester`] adds the freshness cache and the
//! hourly request ceiling in front of it. Every failure here is recoverable:
//! the anchor selector falls back to heuristics.

mod cache;
mod cached;

pub use cache::SuggestionCache;
pub use cached::CachedSuggester;

use crate::types::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SuggesterError {
    #[error("Suggester not configured or unreachable")]
    Unavailable,

    #[error("Suggester request ceiling reached ({limit} per hour)")]
    RateLimited { limit: u32 },

    #[error("Suggester request failed: {0}")]
    Failed(String),
}

/// External text-suggestion service
pub trait Suggester: Send + Sync {
    /// Up to three anchor phrases for linking `source` to `target`
    fn suggest_anchors(
        &self,
        source: NodeId,
        target: NodeId,
        context: Option<&str>,
    ) -> Result<Vec<String>, SuggesterError>;

    /// Candidates from `pool` most relevant to `hub`, best first, at most `limit`
    fn rank_relevant(
        &self,
        hub: NodeId,
        pool: &[NodeId],
        limit: usize,
    ) -> Result<Vec<NodeId>, SuggesterError>;
}

impl<T: Suggester + ?Sized> Suggester for std::sync::Arc<T> {
    fn suggest_anchors(
        &self,
        source: NodeId,
        target: NodeId,
        context: Option<&str>,
    ) -> Result<Vec<String>, SuggesterError> {
        (**self).suggest_anchors(source, target, context)
    }

    fn rank_relevant(
        &self,
        hub: NodeId,
        pool: &[NodeId],
        limit: usize,
    ) -> Result<Vec<NodeId>, SuggesterError> {
        (**self).rank_relevant(hub, pool, limit)
    }
}
