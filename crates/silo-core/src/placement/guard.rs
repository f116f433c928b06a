use crate::types::NodeId;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Per-node write leases.
///
/// A lease is held for the duration of a body write. Save notifications
/// that arrive for a leased node come from the engine's own write and must
/// not re-enter the pipeline.
#[derive(Debug, Default)]
pub struct WriteGuard {
    held: Mutex<HashSet<NodeId>>,
}

impl WriteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> MutexGuard<'_, HashSet<NodeId>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquire the lease for a node. `None` if it is already held.
    pub fn acquire(&self, node: NodeId) -> Option<NodeLease<'_>> {
        if self.held().insert(node) {
            Some(NodeLease { guard: self, node })
        } else {
            None
        }
    }

    pub fn is_held(&self, node: NodeId) -> bool {
        self.held().contains(&node)
    }
}

/// Released on drop
#[derive(Debug)]
pub struct NodeLease<'a> {
    guard: &'a WriteGuard,
    node: NodeId,
}

impl NodeLease<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Drop for NodeLease<'_> {
    fn drop(&mut self) {
        self.guard.held().remove(&self.node);
    }
}
