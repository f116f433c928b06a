//! Where a link goes and how it is written into (and taken out of) a body.

mod guard;
mod locator;
mod mutator;

pub use guard::{NodeLease, WriteGuard};
pub use locator::{InsertionPointLocator, SENTENCE_MATCH_THRESHOLD};
pub use mutator::{ContentMutator, Insertion, RemovalScope};
