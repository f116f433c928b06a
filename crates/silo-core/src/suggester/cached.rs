use super::{Suggester, SuggesterError, SuggestionCache};
use crate::linker::SuggesterConfig;
use crate::types::NodeId;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Rolling one-hour request counter
struct RequestWindow {
    started: Instant,
    count: u32,
}

impl RequestWindow {
    fn try_acquire(&mut self, limit: u32) -> bool {
        if self.started.elapsed() >= WINDOW {
            self.started = Instant::now();
            self.count = 0;
        }
        if self.count >= limit {
            return false;
        }
        self.count += 1;
        true
    }
}

/// Suggester wrapper adding a freshness cache and an hourly request ceiling
pub struct CachedSuggester<S: Suggester> {
    inner: S,
    config: SuggesterConfig,
    cache: Mutex<SuggestionCache>,
    window: Mutex<RequestWindow>,
}

impl<S: Suggester> CachedSuggester<S> {
    pub fn new(inner: S, config: SuggesterConfig) -> Self {
        let cache = SuggestionCache::new(config.cache_ttl);
        Self {
            inner,
            config,
            cache: Mutex::new(cache),
            window: Mutex::new(RequestWindow {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    fn acquire(&self) -> Result<(), SuggesterError> {
        let limit = self.config.max_requests_per_hour;
        let mut window = self
            .window
            .lock()
            .map_err(|_| SuggesterError::Failed("request window lock poisoned".into()))?;
        if window.try_acquire(limit) {
            Ok(())
        } else {
            log::debug!("Suggester ceiling of {} requests/hour reached", limit);
            Err(SuggesterError::RateLimited { limit })
        }
    }

    /// Requests spent in the current window
    pub fn requests_in_window(&self) -> u32 {
        self.window.lock().map(|w| w.count).unwrap_or(0)
    }
}

impl<S: Suggester> Suggester for CachedSuggester<S> {
    fn suggest_anchors(
        &self,
        source: NodeId,
        target: NodeId,
        context: Option<&str>,
    ) -> Result<Vec<String>, SuggesterError> {
        {
            let cache = self
                .cache
                .lock()
                .map_err(|_| SuggesterError::Failed("cache lock poisoned".into()))?;
            if let Some(hit) = cache.get(source, target, context) {
                return Ok(hit.to_vec());
            }
        }

        self.acquire()?;

        let mut anchors = self.inner.suggest_anchors(source, target, context)?;
        anchors.truncate(self.config.max_candidates);

        if let Ok(mut cache) = self.cache.lock() {
            cache.evict_expired();
            cache.put(source, target, context, anchors.clone());
        }

        Ok(anchors)
    }

    fn rank_relevant(
        &self,
        hub: NodeId,
        pool: &[NodeId],
        limit: usize,
    ) -> Result<Vec<NodeId>, SuggesterError> {
        self.acquire()?;
        let mut ranked = self.inner.rank_relevant(hub, pool, limit)?;
        ranked.truncate(limit);
        Ok(ranked)
    }
}
