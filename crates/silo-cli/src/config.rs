use serde::{Deserialize, Serialize};
use silo_core::{AnchorConfig, EngineConfig, SuggesterConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of `silolink.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SilolinkConfig {
    pub store: StoreConfig,
    pub anchor: AnchorTomlConfig,
    pub suggester: SuggesterTomlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `silolink.redb`
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorTomlConfig {
    pub max_alternatives: usize,
    pub max_suffix_attempts: usize,
    pub max_words: usize,
    pub max_chars: usize,
    /// 0 = unlimited
    pub max_anchor_reuse: u64,
    pub preview_variations: usize,
}

impl Default for AnchorTomlConfig {
    fn default() -> Self {
        let d = AnchorConfig::default();
        Self {
            max_alternatives: d.max_alternatives,
            max_suffix_attempts: d.max_suffix_attempts,
            max_words: d.max_words,
            max_chars: d.max_chars,
            max_anchor_reuse: d.max_anchor_reuse,
            preview_variations: d.preview_variations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggesterTomlConfig {
    pub cache_ttl_secs: u64,
    pub max_requests_per_hour: u32,
}

impl Default for SuggesterTomlConfig {
    fn default() -> Self {
        let d = SuggesterConfig::default();
        Self {
            cache_ttl_secs: d.cache_ttl.as_secs(),
            max_requests_per_hour: d.max_requests_per_hour,
        }
    }
}

impl SilolinkConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load the file if it exists, defaults otherwise. A file that fails to
    /// parse is reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Apply command-line / environment overrides
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.store.data_dir = dir;
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.store.data_dir.join("silolink.redb")
    }

    pub fn engine_config(&self) -> EngineConfig {
        let a = &self.anchor;
        let mut anchor = AnchorConfig::new()
            .with_max_alternatives(a.max_alternatives)
            .with_max_suffix_attempts(a.max_suffix_attempts)
            .with_max_words(a.max_words)
            .with_max_anchor_reuse(a.max_anchor_reuse);
        anchor.max_chars = a.max_chars;
        anchor.preview_variations = a.preview_variations;

        let suggester = SuggesterConfig::new()
            .with_cache_ttl(Duration::from_secs(self.suggester.cache_ttl_secs))
            .with_max_requests_per_hour(self.suggester.max_requests_per_hour);

        EngineConfig::new().with_anchor(anchor).with_suggester(suggester)
    }

    /// Every problem found, empty when the config is usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.store.data_dir.as_os_str().is_empty() {
            errors.push("[store] data_dir must not be empty".to_string());
        }
        if self.suggester.max_requests_per_hour == 0 {
            errors.push("[suggester] max_requests_per_hour must be > 0".to_string());
        }
        if let Err(e) = self.engine_config().validate() {
            errors.push(format!("[anchor] {}", e));
        }
        errors
    }

    /// Create the data directory if needed
    pub fn ensure_data_dir(&self) -> anyhow::Result<()> {
        if !self.store.data_dir.exists() {
            std::fs::create_dir_all(&self.store.data_dir)?;
        }
        Ok(())
    }
}
