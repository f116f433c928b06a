//! Link generation: topology planning per linking mode and edge
//! materialisation.
//!
//! A run:
//! - Normalises the silo's loosely typed settings once
//! - Plans an ordered edge list for the linking mode (with no-hub fallbacks)
//! - Materialises each edge: anchor, insertion point, body write, link record
//! - Counts what was created and why the rest was skipped

mod builder;
mod config;
mod context;
mod metrics;
mod settings;
mod topology;

#[cfg(test)]
mod tests;

pub use builder::{LinkGraphBuilder, Preview, PreviewEntry};
pub use config::{AnchorConfig, EngineConfig, SuggesterConfig};
pub use context::RunContext;
pub use metrics::{RunMetrics, SkipReason};
pub use settings::{
    Count, Flag, PatternEndpoint, PatternRule, RawEndpoint, RawPatternRule, RawSettings,
    Settings, DEFAULT_MAX_CONTEXTUAL_LINKS, DEFAULT_MAX_CROSS_LINKS_PER_POST,
    DEFAULT_MAX_HUB_LINKS,
};
pub use topology::{Edge, Plan, RelatedFn, TopologyPlanner};
