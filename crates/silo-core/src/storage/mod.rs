mod redb_storage;
mod traits;

pub use redb_storage::{RedbStore, CURRENT_SCHEMA_VERSION};
pub use traits::{ContentStore, Store, StoreStats};
