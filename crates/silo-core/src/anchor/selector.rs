use super::clean::clean_anchor;
use super::heuristics::PairText;
use crate::linker::{AnchorConfig, RunContext};
use crate::suggester::Suggester;
use crate::text::{floor_char_boundary, word_count};
use crate::types::{Node, MAX_ANCHOR_CHARS};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// The anchor picked for an edge, plus unused alternatives for previews
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorChoice {
    pub text: String,
    /// Whether a numeric suffix was needed to keep the anchor unique.
    pub suffixed: bool,
    pub variations: Vec<String>,
}

/// Produces validated, run-unique anchor text for an edge.
///
/// Candidates come from the suggester (multi-word suggestions first) and
/// then from the heuristic strategies. Each is cleaned, checked against the
/// caller's admissibility filter and the run's used-anchor set. After a
/// collision at most `max_alternatives` further candidates are examined
/// before falling back to numeric suffixes.
pub struct AnchorTextSelector {
    suggester: Option<Arc<dyn Suggester>>,
    config: AnchorConfig,
}

impl AnchorTextSelector {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            suggester: None,
            config,
        }
    }

    pub fn with_suggester(mut self, suggester: Arc<dyn Suggester>) -> Self {
        self.suggester = Some(suggester);
        self
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    /// Select and claim an anchor. `None` means the edge gets no link.
    pub fn select(
        &self,
        source: &Node,
        target: &Node,
        ctx: &mut RunContext,
        admissible: &dyn Fn(&str) -> bool,
    ) -> Option<String> {
        self.choose(source, target, ctx, admissible, 0).map(|c| c.text)
    }

    /// Like [`select`](Self::select), also collecting up to `variations`
    /// further admissible, unused alternatives.
    pub fn choose(
        &self,
        source: &Node,
        target: &Node,
        ctx: &mut RunContext,
        admissible: &dyn Fn(&str) -> bool,
        variations: usize,
    ) -> Option<AnchorChoice> {
        let mut queue: VecDeque<String> = self.suggested(source, target, None, ctx).into();
        queue.extend(
            PairText::new(source, target)
                .candidates()
                .into_iter()
                .map(|c| c.text),
        );

        let mut seen = HashSet::new();
        let mut collision: Option<String> = None;
        let mut alternatives = 0;
        let mut chosen: Option<String> = None;

        while let Some(raw) = queue.pop_front() {
            let Some(cleaned) = clean_anchor(&raw, &self.config) else {
                continue;
            };
            if !seen.insert(cleaned.to_lowercase()) {
                continue;
            }
            if collision.is_some() {
                if alternatives >= self.config.max_alternatives {
                    break;
                }
                alternatives += 1;
            }
            if !admissible(&cleaned) {
                continue;
            }
            if ctx.is_used(&cleaned) {
                if collision.is_none() {
                    let avoid = format!("avoid: {}", cleaned);
                    for alt in self.suggested(source, target, Some(&avoid), ctx).into_iter().rev() {
                        queue.push_front(alt);
                    }
                    collision = Some(cleaned);
                }
                continue;
            }
            chosen = Some(cleaned);
            break;
        }

        let mut suffixed = false;
        if chosen.is_none() {
            if let Some(base) = &collision {
                chosen = self.with_suffix(base, ctx, admissible);
                suffixed = chosen.is_some();
            }
        }

        let text = chosen?;
        ctx.claim(&text);
        if suffixed {
            ctx.metrics.suffixed_anchors += 1;
        }

        let mut found = Vec::new();
        while found.len() < variations {
            let Some(raw) = queue.pop_front() else { break };
            let Some(cleaned) = clean_anchor(&raw, &self.config) else {
                continue;
            };
            if seen.insert(cleaned.to_lowercase()) && admissible(&cleaned) && !ctx.is_used(&cleaned) {
                found.push(cleaned);
            }
        }

        Some(AnchorChoice {
            text,
            suffixed,
            variations: found,
        })
    }

    /// `"<base> 2"`, `"<base> 3"`, ... bounded by `max_suffix_attempts`
    fn with_suffix(
        &self,
        base: &str,
        ctx: &RunContext,
        admissible: &dyn Fn(&str) -> bool,
    ) -> Option<String> {
        let max_chars = self.config.max_chars.min(MAX_ANCHOR_CHARS);
        (2..2 + self.config.max_suffix_attempts).find_map(|n| {
            let suffix = format!(" {}", n);
            let room = max_chars.saturating_sub(suffix.len());
            let stem = if base.len() > room {
                base[..floor_char_boundary(base, room)].trim_end()
            } else {
                base
            };
            if stem.is_empty() {
                return None;
            }
            let candidate = format!("{}{}", stem, suffix);
            (!ctx.is_used(&candidate) && admissible(&candidate)).then_some(candidate)
        })
    }

    /// Suggester candidates, multi-word ones first. Any failure yields none.
    fn suggested(
        &self,
        source: &Node,
        target: &Node,
        context: Option<&str>,
        ctx: &mut RunContext,
    ) -> Vec<String> {
        let Some(suggester) = &self.suggester else {
            return Vec::new();
        };

        match suggester.suggest_anchors(source.id, target.id, context) {
            Ok(raw) => {
                let (best, fallback): (Vec<String>, Vec<String>) = raw
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty() && s.chars().count() <= MAX_ANCHOR_CHARS)
                    .take(3)
                    .partition(|s| word_count(s) >= 2);
                best.into_iter().chain(fallback).collect()
            }
            Err(e) => {
                log::debug!(
                    "Suggester fallback for {} -> {}: {}",
                    source.id,
                    target.id,
                    e
                );
                ctx.metrics.suggester_fallbacks += 1;
                Vec::new()
            }
        }
    }
}
