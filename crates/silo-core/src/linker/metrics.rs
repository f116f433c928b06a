use crate::types::LinkingMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why a planned edge was not materialised. None of these abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SelfLink,
    Unpublished,
    ExcludedTarget,
    AlreadyLinked,
    NoAnchor,
    NoAttachableText,
    PersistFailure,
    NodeMissing,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::SelfLink => "self_link",
            SkipReason::Unpublished => "unpublished",
            SkipReason::ExcludedTarget => "excluded_target",
            SkipReason::AlreadyLinked => "already_linked",
            SkipReason::NoAnchor => "no_anchor",
            SkipReason::NoAttachableText => "no_attachable_text",
            SkipReason::PersistFailure => "persist_failure",
            SkipReason::NodeMissing => "node_missing",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics for one generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Mode the edges were planned with, after any no-hub substitution.
    pub mode: Option<LinkingMode>,

    /// Edges emitted by the topology planner.
    pub edges_planned: u64,

    /// Edges materialised (marker written and link persisted).
    pub edges_created: u64,

    /// Skipped edges by reason.
    pub skipped: BTreeMap<SkipReason, u64>,

    /// Link records deleted after a failed body write.
    pub rollbacks: u64,

    /// Suggester calls that failed or were throttled.
    pub suggester_fallbacks: u64,

    /// Anchors that needed a numeric suffix to stay unique.
    pub suffixed_anchors: u64,

    /// Wall time of the run.
    #[serde(with = "duration_serializer")]
    pub duration: Duration,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        let skipped = self
            .skipped
            .iter()
            .map(|(reason, n)| format!("{}={}", reason, n))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Run [{}]: planned {} edges, created {}, skipped {} ({}), rolled back {}, \
             {} suggester fallbacks, {} suffixed anchors in {:?}",
            self.mode.map_or("none", |m| m.as_str()),
            self.edges_planned,
            self.edges_created,
            self.skipped_total(),
            if skipped.is_empty() { "-" } else { skipped.as_str() },
            self.rollbacks,
            self.suggester_fallbacks,
            self.suffixed_anchors,
            self.duration
        )
    }
}

// Custom serializer for Duration
mod duration_serializer {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_counts_and_summary() {
        let mut metrics = RunMetrics::new();
        metrics.mode = Some(LinkingMode::Linear);
        metrics.edges_planned = 3;
        metrics.edges_created = 1;
        metrics.record_skip(SkipReason::NoAnchor);
        metrics.record_skip(SkipReason::NoAnchor);

        assert_eq!(metrics.skipped_total(), 2);
        assert_eq!(metrics.skipped_for(SkipReason::NoAnchor), 2);
        assert_eq!(metrics.skipped_for(SkipReason::SelfLink), 0);

        let summary = metrics.summary();
        assert!(summary.contains("[linear]"));
        assert!(summary.contains("no_anchor=2"));
    }

    #[test]
    fn test_serializes_as_json() {
        let mut metrics = RunMetrics::new();
        metrics.record_skip(SkipReason::AlreadyLinked);
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"already_linked\":1"));
    }
}
