//! Anchor text selection: suggester candidates, heuristic fallbacks,
//! canonical cleaning and run-scoped deduplication.

mod clean;
mod heuristics;
mod selector;

pub use clean::{clean_anchor, has_content_token};
pub use heuristics::{Candidate, PairText, Strategy};
pub use selector::{AnchorChoice, AnchorTextSelector};
