pub mod types;
pub mod storage;
pub mod error;
pub mod text;
pub mod scoring;
pub mod anchor;
pub mod placement;
pub mod suggester;
pub mod linker;

pub use error::{SiloError, Result};
pub use types::*;
pub use storage::{ContentStore, Store, StoreStats, RedbStore, CURRENT_SCHEMA_VERSION};
pub use scoring::{NodeFeatures, RelatednessScorer, RelatednessWeights, MIN_RELATEDNESS};
pub use anchor::{clean_anchor, AnchorChoice, AnchorTextSelector};
pub use placement::{ContentMutator, Insertion, InsertionPointLocator, RemovalScope, WriteGuard};
pub use suggester::{CachedSuggester, Suggester, SuggesterError, SuggestionCache};
pub use linker::{
    AnchorConfig, EngineConfig, LinkGraphBuilder, Preview, PreviewEntry, RawEndpoint,
    RawSettings, RunContext, RunMetrics, Settings, SkipReason, SuggesterConfig,
};
