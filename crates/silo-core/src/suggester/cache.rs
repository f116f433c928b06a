use crate::types::NodeId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

type CacheKey = (NodeId, NodeId, String);

struct CachedSuggestion {
    anchors: Vec<String>,
    fetched_at: Instant,
}

/// Suggestions keyed by (source, target, context) with a freshness window
pub struct SuggestionCache {
    entries: HashMap<CacheKey, CachedSuggestion>,
    ttl: Duration,
}

impl SuggestionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn key(source: NodeId, target: NodeId, context: Option<&str>) -> CacheKey {
        (source, target, context.unwrap_or_default().to_string())
    }

    /// Return cached anchors if still fresh.
    pub fn get(&self, source: NodeId, target: NodeId, context: Option<&str>) -> Option<&[String]> {
        self.entries
            .get(&Self::key(source, target, context))
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.anchors.as_slice())
    }

    pub fn put(&mut self, source: NodeId, target: NodeId, context: Option<&str>, anchors: Vec<String>) {
        self.entries.insert(
            Self::key(source, target, context),
            CachedSuggestion {
                anchors,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries
    pub fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.fetched_at.elapsed() < ttl);
    }
}
