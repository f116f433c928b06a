use crate::error::{Result, SiloError};
use crate::types::MAX_ANCHOR_CHARS;
use std::time::Duration;

/// Configuration for the link engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Anchor text selection limits.
    pub anchor: AnchorConfig,

    /// Suggester cache and throttle.
    pub suggester: SuggesterConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, anchor: AnchorConfig) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_suggester(mut self, suggester: SuggesterConfig) -> Self {
        self.suggester = suggester;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.anchor.validate()?;
        self.suggester.validate()?;
        Ok(())
    }
}

/// Configuration for anchor text selection
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Alternatives requested when a candidate collides with a used anchor. Default: 10.
    pub max_alternatives: usize,

    /// Numeric suffix attempts after alternatives run out. Default: 5.
    pub max_suffix_attempts: usize,

    /// Word cap applied by the canonicaliser. Default: 6.
    pub max_words: usize,

    /// Character cap applied by the canonicaliser. Default: 100.
    pub max_chars: usize,

    /// Reject candidates already used by this many active links site-wide.
    /// 0 disables the check. Default: 0.
    pub max_anchor_reuse: u64,

    /// Alternatives reported alongside each preview entry. Default: 3.
    pub preview_variations: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            max_alternatives: 10,
            max_suffix_attempts: 5,
            max_words: 6,
            max_chars: MAX_ANCHOR_CHARS,
            max_anchor_reuse: 0,
            preview_variations: 3,
        }
    }
}

impl AnchorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_alternatives(mut self, max: usize) -> Self {
        self.max_alternatives = max;
        self
    }

    pub fn with_max_suffix_attempts(mut self, max: usize) -> Self {
        self.max_suffix_attempts = max;
        self
    }

    pub fn with_max_words(mut self, max: usize) -> Self {
        self.max_words = max;
        self
    }

    pub fn with_max_anchor_reuse(mut self, max: u64) -> Self {
        self.max_anchor_reuse = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(SiloError::Validation("max_words must be > 0".into()));
        }

        if self.max_chars == 0 || self.max_chars > MAX_ANCHOR_CHARS {
            return Err(SiloError::Validation(format!(
                "max_chars must be between 1 and {}",
                MAX_ANCHOR_CHARS
            )));
        }

        Ok(())
    }
}

/// Configuration for the text-suggestion service wrapper
#[derive(Debug, Clone)]
pub struct SuggesterConfig {
    /// How long a cached suggestion stays fresh. Default: 24 hours.
    pub cache_ttl: Duration,

    /// Requests allowed per rolling hour before falling back to heuristics. Default: 60.
    pub max_requests_per_hour: u32,

    /// Candidates requested per edge. Default: 3.
    pub max_candidates: usize,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            max_requests_per_hour: 60,
            max_candidates: 3,
        }
    }
}

impl SuggesterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_requests_per_hour(mut self, max: u32) -> Self {
        self.max_requests_per_hour = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 || self.max_candidates > 3 {
            return Err(SiloError::Validation(
                "max_candidates must be between 1 and 3".into(),
            ));
        }

        Ok(())
    }
}
