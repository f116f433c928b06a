use crate::error::{Result, SiloError};
use crate::types::{Link, LinkId, Member, Node, NodeId, PublishState, Silo, SiloId};

/// Persistence for silo metadata, generated links and exclusion lists
pub trait Store: Send + Sync {
    // === Silo Operations ===

    /// Retrieve a silo by ID
    fn get_silo(&self, id: SiloId) -> Result<Option<Silo>>;

    /// All silos, in creation order
    fn list_silos(&self) -> Result<Vec<Silo>>;

    /// Members of a silo ordered by stored position
    fn get_members(&self, silo_id: SiloId) -> Result<Vec<Member>>;

    // === Link Operations ===

    /// Persist a new link. Fails with `DuplicateLink` if an active link
    /// already exists for the same (silo, source, target).
    fn create_link(&self, link: &Link) -> Result<()>;

    /// Retrieve a link by ID, whatever its status
    fn get_link(&self, id: LinkId) -> Result<Option<Link>>;

    /// Hard delete. Only used to unwind a link whose body write failed.
    fn delete_link(&self, id: LinkId) -> Result<()>;

    /// Active links originating from a node, optionally within one silo
    fn get_links_from(&self, node_id: NodeId, silo_id: Option<SiloId>) -> Result<Vec<Link>>;

    /// Mark active links from a node as removed. Returns how many changed.
    fn mark_removed(&self, node_id: NodeId, silo_id: Option<SiloId>) -> Result<u64>;

    // === Exclusions ===

    /// Whether a node must never be linked to
    fn is_excluded_target(&self, node_id: NodeId) -> Result<bool>;

    /// Whether an anchor text is banned (case-insensitive)
    fn is_excluded_anchor(&self, text: &str) -> Result<bool>;

    /// Number of active links using this anchor text (case-insensitive)
    fn anchor_usage_count(&self, text: &str) -> Result<u64>;

    // === Provided ===

    /// Whether an active link already covers this ordered pair
    fn has_active_link(&self, silo_id: SiloId, source: NodeId, target: NodeId) -> Result<bool> {
        Ok(self
            .get_links_from(source, Some(silo_id))?
            .iter()
            .any(|l| l.target == target && l.is_active()))
    }
}

/// Access to document bodies and publication metadata
pub trait ContentStore: Send + Sync {
    /// Retrieve a full node by ID
    fn get_node(&self, id: NodeId) -> Result<Option<Node>>;

    /// Replace a node's body
    fn set_body(&self, id: NodeId, body: &str) -> Result<()>;

    fn get_body(&self, id: NodeId) -> Result<String> {
        self.get_node(id)?
            .map(|n| n.body)
            .ok_or(SiloError::NodeNotFound(id))
    }

    fn get_permalink(&self, id: NodeId) -> Result<String> {
        self.get_node(id)?
            .map(|n| n.permalink)
            .ok_or(SiloError::NodeNotFound(id))
    }

    fn get_publish_state(&self, id: NodeId) -> Result<PublishState> {
        self.get_node(id)?
            .map(|n| n.publish_state)
            .ok_or(SiloError::NodeNotFound(id))
    }
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub node_count: u64,
    pub silo_count: u64,
    pub active_links: u64,
    pub removed_links: u64,
    pub excluded_targets: u64,
    pub excluded_anchors: u64,
}
