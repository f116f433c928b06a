use crate::linker::RawSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a content document. Owned by the hosting content system.
pub type NodeId = u64;

/// Type alias for silo identifiers
pub type SiloId = Uuid;

/// Type alias for link identifiers
pub type LinkId = Uuid;

/// Maximum anchor text length in characters.
pub const MAX_ANCHOR_CHARS: usize = 100;

/// A content document that can take part in a silo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Identity assigned by the content system.
    pub id: NodeId,

    /// Human-readable title. Drives most anchor heuristics.
    pub title: String,

    /// Rich text / prose. The only field the engine writes.
    pub body: String,

    /// Only published documents receive or emit links.
    pub publish_state: PublishState,

    /// Public URL used as the link target.
    pub permalink: String,

    /// Taxonomy category names. Used by the relatedness scorer
    /// and the shared-category anchor heuristic.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Last time the body was written.
    pub updated_at: DateTime<Utc>,
}

/// Publication state of a document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Published,
    Draft,
    Pending,
    Private,
    Trashed,
}

impl PublishState {
    pub fn is_published(self) -> bool {
        matches!(self, PublishState::Published)
    }
}

impl Node {
    /// Create a published node with an empty permalink
    pub fn new(id: NodeId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Node {
            id,
            title: title.into(),
            body: body.into(),
            publish_state: PublishState::Published,
            permalink: format!("/?p={}", id),
            categories: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = permalink.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_publish_state(mut self, state: PublishState) -> Self {
        self.publish_state = state;
        self
    }

    pub fn is_published(&self) -> bool {
        self.publish_state.is_published()
    }

    /// Validate the node before it is persisted
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("Node {} has an empty title", self.id));
        }
        if self.title.chars().count() > 512 {
            return Err(format!("Node {} title exceeds 512 characters", self.id));
        }
        Ok(())
    }
}

/// Topology policy of a silo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkingMode {
    /// Hub → first support, forward chain, optional loops back to the hub.
    Linear,
    /// Bidirectional adjacency between neighbouring supports.
    Chained,
    /// Every node links to every other node, capped per source.
    CrossLinking,
    /// Supports and hub link to each other only.
    StarHub,
    /// Star plus a bidirectional chain between supports.
    HubChain,
    /// Top-K most related nodes by lexical relatedness.
    AiContextual,
    /// User-declared rule list.
    Custom,
}

impl LinkingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkingMode::Linear => "linear",
            LinkingMode::Chained => "chained",
            LinkingMode::CrossLinking => "cross_linking",
            LinkingMode::StarHub => "star_hub",
            LinkingMode::HubChain => "hub_chain",
            LinkingMode::AiContextual => "ai_contextual",
            LinkingMode::Custom => "custom",
        }
    }

    pub fn all() -> [LinkingMode; 7] {
        [
            LinkingMode::Linear,
            LinkingMode::Chained,
            LinkingMode::CrossLinking,
            LinkingMode::StarHub,
            LinkingMode::HubChain,
            LinkingMode::AiContextual,
            LinkingMode::Custom,
        ]
    }
}

impl fmt::Display for LinkingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        LinkingMode::all()
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("Unknown linking mode '{}'", s))
    }
}

/// A member reference with its stored ordering position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub node_id: NodeId,
    pub position: u32,
}

/// A named collection of documents governed by a single linking mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Silo {
    /// Unique identifier. UUIDv7.
    pub id: SiloId,

    /// Display name.
    pub name: String,

    /// Optional central document ("pillar").
    pub hub: Option<NodeId>,

    /// Member references. May or may not include the hub.
    pub members: Vec<Member>,

    /// Topology policy.
    pub mode: LinkingMode,

    /// Loosely typed settings as received from the setup operation.
    /// Normalised once per run.
    #[serde(default)]
    pub settings: RawSettings,

    pub created_at: DateTime<Utc>,
}

impl Silo {
    pub fn new(name: impl Into<String>, mode: LinkingMode) -> Self {
        Silo {
            id: Uuid::now_v7(),
            name: name.into(),
            hub: None,
            members: Vec::new(),
            mode,
            settings: RawSettings::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_hub(mut self, hub: NodeId) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Set members in the given order; positions are assigned sequentially.
    pub fn with_members(mut self, ids: &[NodeId]) -> Self {
        self.members = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Member {
                node_id: *id,
                position: i as u32,
            })
            .collect();
        self
    }

    pub fn with_settings(mut self, settings: RawSettings) -> Self {
        self.settings = settings;
        self
    }

    /// True if the node is the hub or one of the members
    pub fn contains(&self, node: NodeId) -> bool {
        self.hub == Some(node) || self.members.iter().any(|m| m.node_id == node)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Silo name must not be empty".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for member in &self.members {
            if !seen.insert(member.node_id) {
                return Err(format!("Node {} listed twice in silo", member.node_id));
            }
        }
        Ok(())
    }
}

/// Where the link ended up in the source body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Natural,
    FirstParagraph,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Active,
    Removed,
}

/// A generated internal link between two documents of a silo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// Unique identifier. UUIDv7. Also keys the body markers.
    pub id: LinkId,

    pub silo_id: SiloId,

    /// Document whose body carries the link.
    pub source: NodeId,

    /// Document the link points at.
    pub target: NodeId,

    /// Selected anchor text. 1..=100 characters.
    pub anchor_text: String,

    /// Byte offset proposed by the insertion locator.
    pub insertion_offset: usize,

    pub placement: Placement,

    pub status: LinkStatus,

    /// Ordering key within the run that created the link.
    pub position: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Link {
    pub fn new(
        silo_id: SiloId,
        source: NodeId,
        target: NodeId,
        anchor_text: impl Into<String>,
        insertion_offset: usize,
        position: u32,
    ) -> Self {
        let now = Utc::now();
        Link {
            id: Uuid::now_v7(),
            silo_id,
            source,
            target,
            anchor_text: anchor_text.into(),
            insertion_offset,
            placement: Placement::Natural,
            status: LinkStatus::Active,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == LinkStatus::Active
    }

    /// Validate the structural invariants of a link
    pub fn validate(&self) -> Result<(), String> {
        if self.source == self.target {
            return Err("Self-links are not allowed".to_string());
        }

        let len = self.anchor_text.chars().count();
        if self.anchor_text.trim().is_empty() || len > MAX_ANCHOR_CHARS {
            return Err(format!(
                "Anchor text length {} out of range [1, {}]",
                len, MAX_ANCHOR_CHARS
            ));
        }

        Ok(())
    }

    pub fn mark_removed(&mut self) {
        self.status = LinkStatus::Removed;
        self.updated_at = Utc::now();
    }
}
