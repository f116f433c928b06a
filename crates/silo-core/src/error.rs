use crate::types::{LinkId, NodeId, SiloId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SiloError>;

#[derive(Debug, Error)]
pub enum SiloError {
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Silo not found: {0}")]
    SiloNotFound(SiloId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("Invalid link: {reason}")]
    InvalidLink { reason: String },

    #[error("Duplicate link: silo={silo}, source={source_id}, target={target_id}")]
    DuplicateLink {
        silo: SiloId,
        source_id: NodeId,
        target_id: NodeId,
    },

    #[error("No attachable text for anchor '{anchor}' in node {node}")]
    NoAttachableText { node: NodeId, anchor: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Content write failed for node {node}: {reason}")]
    ContentWrite { node: NodeId, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SiloError {
    /// Errors that abort a whole operation rather than a single edge.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SiloError::SiloNotFound(_) | SiloError::NodeNotFound(_) | SiloError::LinkNotFound(_)
        )
    }
}
