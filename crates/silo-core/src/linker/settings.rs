use crate::types::NodeId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_HUB_LINKS: usize = 5;
pub const DEFAULT_MAX_CONTEXTUAL_LINKS: usize = 3;
pub const DEFAULT_MAX_CROSS_LINKS_PER_POST: usize = 5;

/// Boolean as it arrives from the setup operation: `true`, `1`, `"1"`, `"true"`, ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Flag {
    /// Interpret the flag. `None` for text that is neither truthy nor falsy.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Flag::Bool(b) => Some(*b),
            Flag::Int(i) => Some(*i != 0),
            Flag::Text(s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Flag::Bool(b)
    }
}

impl From<i64> for Flag {
    fn from(i: i64) -> Self {
        Flag::Int(i)
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        Flag::Text(s.to_string())
    }
}

/// Count as it arrives from the setup operation: `5` or `"5"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Count {
    Int(i64),
    Text(String),
}

impl Count {
    pub fn value(&self) -> Option<usize> {
        let raw = match self {
            Count::Int(i) => *i,
            Count::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        Some(raw.max(0) as usize)
    }
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count::Int(n as i64)
    }
}

/// One side of a custom pattern rule before resolution: a node id or the token "hub".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawEndpoint {
    Id(u64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPatternRule {
    pub source: RawEndpoint,
    pub target: RawEndpoint,
}

/// Silo settings exactly as persisted. Never read downstream of normalisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_to_hub: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_to_supports: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hub_links: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contextual_links: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cross_links_per_post: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pattern: Option<Vec<RawPatternRule>>,
}

impl RawSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supports_to_hub(mut self, flag: impl Into<Flag>) -> Self {
        self.supports_to_hub = Some(flag.into());
        self
    }

    pub fn with_hub_to_supports(mut self, flag: impl Into<Flag>) -> Self {
        self.hub_to_supports = Some(flag.into());
        self
    }

    pub fn with_max_hub_links(mut self, max: usize) -> Self {
        self.max_hub_links = Some(max.into());
        self
    }

    pub fn with_max_contextual_links(mut self, max: usize) -> Self {
        self.max_contextual_links = Some(max.into());
        self
    }

    pub fn with_max_cross_links_per_post(mut self, max: usize) -> Self {
        self.max_cross_links_per_post = Some(max.into());
        self
    }

    pub fn with_rule(mut self, source: RawEndpoint, target: RawEndpoint) -> Self {
        self.custom_pattern
            .get_or_insert_with(Vec::new)
            .push(RawPatternRule { source, target });
        self
    }

    /// Normalise into the strict typed form. Called once per run.
    pub fn normalize(&self) -> Settings {
        let supports_to_hub = self.supports_to_hub.as_ref().and_then(|f| {
            let v = f.truthy();
            if v.is_none() {
                log::warn!("Unrecognised supports_to_hub value {:?}, using default", f);
            }
            v
        });
        let hub_to_supports = self.hub_to_supports.as_ref().and_then(|f| {
            let v = f.truthy();
            if v.is_none() {
                log::warn!("Unrecognised hub_to_supports value {:?}, using default", f);
            }
            v
        });

        let custom_pattern = self
            .custom_pattern
            .iter()
            .flatten()
            .filter_map(|rule| {
                let resolved = PatternEndpoint::parse(&rule.source)
                    .zip(PatternEndpoint::parse(&rule.target))
                    .map(|(source, target)| PatternRule { source, target });
                if resolved.is_none() {
                    log::warn!("Dropping malformed custom pattern rule {:?}", rule);
                }
                resolved
            })
            .collect();

        Settings {
            supports_to_hub: supports_to_hub.unwrap_or(true),
            hub_to_supports: hub_to_supports.unwrap_or(false),
            supports_to_hub_explicit: supports_to_hub.is_some(),
            hub_to_supports_explicit: hub_to_supports.is_some(),
            max_hub_links: count_or(&self.max_hub_links, DEFAULT_MAX_HUB_LINKS),
            max_contextual_links: count_or(
                &self.max_contextual_links,
                DEFAULT_MAX_CONTEXTUAL_LINKS,
            ),
            max_cross_links_per_post: count_or(
                &self.max_cross_links_per_post,
                DEFAULT_MAX_CROSS_LINKS_PER_POST,
            ),
            custom_pattern,
        }
    }
}

fn count_or(count: &Option<Count>, default: usize) -> usize {
    count.as_ref().and_then(Count::value).unwrap_or(default)
}

/// A resolved side of a custom rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternEndpoint {
    Hub,
    Node(NodeId),
}

impl PatternEndpoint {
    fn parse(raw: &RawEndpoint) -> Option<Self> {
        match raw {
            RawEndpoint::Id(id) => Some(PatternEndpoint::Node(*id)),
            RawEndpoint::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("hub") {
                    Some(PatternEndpoint::Hub)
                } else {
                    s.parse::<NodeId>().ok().map(PatternEndpoint::Node)
                }
            }
        }
    }

    /// Resolve against the silo hub. `None` when the rule names a hub that does not exist.
    pub fn resolve(self, hub: Option<NodeId>) -> Option<NodeId> {
        match self {
            PatternEndpoint::Hub => hub,
            PatternEndpoint::Node(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRule {
    pub source: PatternEndpoint,
    pub target: PatternEndpoint,
}

/// Strictly typed per-run silo settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub supports_to_hub: bool,
    pub hub_to_supports: bool,
    /// Whether `supports_to_hub` was present in the raw settings.
    pub supports_to_hub_explicit: bool,
    /// Whether `hub_to_supports` was present in the raw settings.
    pub hub_to_supports_explicit: bool,
    pub max_hub_links: usize,
    pub max_contextual_links: usize,
    pub max_cross_links_per_post: usize,
    pub custom_pattern: Vec<PatternRule>,
}

impl Default for Settings {
    fn default() -> Self {
        RawSettings::default().normalize()
    }
}
