use crate::error::{Result, SiloError};
use crate::text::{
    find_phrase_outside, markup_spans, paragraph_spans, significant_words, word_windows, words,
};
use crate::types::{Link, LinkId, Node, Placement};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)<!-- silo-link:([0-9a-fA-F-]{36}) --><a\b(?:[^>"]|"[^"]*")*>(.*?)</a><!-- /silo-link:([0-9a-fA-F-]{36}) -->"#,
        )
        .expect("valid marker pattern")
    })
}

/// Which markers a removal touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalScope {
    Link(LinkId),
    All,
}

/// Result of wrapping text in a body
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    pub body: String,
    /// The body text that became the clickable anchor.
    pub attached: String,
    /// Byte range of the attached text in the original body.
    pub range: Range<usize>,
    pub placement: Placement,
}

/// Inserts and removes marked links in document bodies.
///
/// Every inserted link is wrapped in a start/end comment pair keyed by the
/// link id. Removal replaces the whole construct with the text it wrapped,
/// so insert followed by remove restores the original body byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMutator;

impl ContentMutator {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the first attachable occurrence of the link's anchor in `source`.
    ///
    /// Attachment order: the anchor itself, the target title, the longest
    /// contiguous run covering at least 60% of the anchor words, 2-word
    /// title windows, then a single significant title word.
    pub fn insert(&self, source: &Node, target: &Node, link: &Link) -> Result<Insertion> {
        if !source.is_published() || !target.is_published() {
            return Err(SiloError::InvalidState(format!(
                "Refusing to link {} -> {}: both nodes must be published",
                source.id, target.id
            )));
        }

        let body = &source.body;
        let protected = markup_spans(body);
        let range = attach_candidates(&link.anchor_text, &target.title)
            .iter()
            .find_map(|phrase| find_phrase_outside(body, phrase, &protected))
            .ok_or_else(|| SiloError::NoAttachableText {
                node: source.id,
                anchor: link.anchor_text.clone(),
            })?;

        let attached = body[range.clone()].to_string();
        let placement = match paragraph_spans(body).first() {
            Some(first) if range.start < first.end => Placement::FirstParagraph,
            _ => Placement::Natural,
        };

        let mut out = String::with_capacity(body.len() + 160);
        out.push_str(&body[..range.start]);
        out.push_str(&link_markup(link.id, &target.permalink, &attached));
        out.push_str(&body[range.end..]);

        Ok(Insertion {
            body: out,
            attached,
            range,
            placement,
        })
    }

    /// Strip markers in scope, restoring the wrapped text. Returns the new
    /// body and how many links were unwrapped.
    pub fn remove(&self, body: &str, scope: RemovalScope) -> (String, usize) {
        let mut removed = 0;
        let out = marker_re().replace_all(body, |caps: &Captures| {
            let open = &caps[1];
            let close = &caps[3];
            let in_scope = match scope {
                RemovalScope::All => true,
                RemovalScope::Link(id) => open.eq_ignore_ascii_case(&id.to_string()),
            };
            if open.eq_ignore_ascii_case(close) && in_scope {
                removed += 1;
                caps[2].to_string()
            } else {
                caps[0].to_string()
            }
        });
        (out.into_owned(), removed)
    }

    /// Ids of every well-formed marker pair in a body
    pub fn marker_ids(&self, body: &str) -> Vec<String> {
        marker_re()
            .captures_iter(body)
            .filter(|c| c[1].eq_ignore_ascii_case(&c[3]))
            .map(|c| c[1].to_lowercase())
            .collect()
    }
}

fn link_markup(id: LinkId, permalink: &str, text: &str) -> String {
    let href = permalink
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<!-- silo-link:{id} --><a href="{href}" class="silo-link" data-silo-link="{id}">{text}</a><!-- /silo-link:{id} -->"#
    )
}

/// Phrases to look for in the body, in preference order
fn attach_candidates(anchor: &str, title: &str) -> Vec<String> {
    let mut phrases = vec![anchor.to_string(), title.to_string()];

    let anchor_words = words(anchor);
    let n = anchor_words.len();
    if n >= 2 {
        // at least 60% of the anchor words
        let min_run = (n * 3).div_ceil(5);
        for len in (min_run..n).rev() {
            phrases.extend(anchor_words.windows(len).map(|w| w.join(" ")));
        }
    }

    phrases.extend(word_windows(title, 2));
    phrases.extend(significant_words(title).into_iter().map(str::to_string));

    phrases.retain(|p| !p.trim().is_empty());
    phrases
}
