//! Text scanning primitives shared by anchor selection, insertion location
//! and the content mutator. Everything that reads prose lives here so the
//! graph and selection logic never touch raw string parsing.

mod lexicon;

pub use lexicon::{
    is_edge_stopword, is_stopword, related_terms, CONTEXT_PREFIXES, EDGE_STOPWORDS, STOPWORDS,
    TOPIC_CLUSTERS,
};

use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'’\-]*").expect("valid word pattern"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("valid tag pattern"))
}

fn protected_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<!--.*?-->|<a\b[^>]*>.*?</a\s*>|<h[1-6]\b[^>]*>.*?</h[1-6]\s*>|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<[^>]+>",
        )
        .expect("valid markup pattern")
    })
}

fn paragraph_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\n[ \t\r]*\n|<p\b[^>]*>|</p\s*>").expect("valid paragraph pattern"))
}

/// Words in order of appearance, original case
pub fn words(text: &str) -> Vec<&str> {
    word_re().find_iter(text).map(|m| m.as_str()).collect()
}

pub fn word_count(text: &str) -> usize {
    word_re().find_iter(text).count()
}

/// Content keywords: lowercase, longer than 3 characters, not stopwords,
/// unique, in order of first appearance.
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !is_stopword(w))
        .map(|w| w.to_lowercase())
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

pub fn keyword_set(text: &str) -> HashSet<String> {
    keywords(text).into_iter().collect()
}

/// Lowercase non-stopword title terms
pub fn title_terms(title: &str) -> HashSet<String> {
    words(title)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .map(|w| w.to_lowercase())
        .collect()
}

/// Words longer than 3 characters that are not stopwords, original case
pub fn significant_words(text: &str) -> Vec<&str> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !is_stopword(w))
        .collect()
}

/// Consecutive n-word windows of `text`
pub fn word_windows(text: &str, n: usize) -> Vec<String> {
    let w = words(text);
    if n == 0 || w.len() < n {
        return Vec::new();
    }
    w.windows(n).map(|win| win.join(" ")).collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Readable text of a rich-text body: tags and comments removed,
/// common entities decoded, whitespace collapsed.
pub fn strip_markup(body: &str) -> String {
    let without_tags = tag_re().replace_all(body, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#8217;", "’")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    collapse_whitespace(&decoded)
}

pub fn is_capitalized(word: &str) -> bool {
    word.chars().next().map_or(false, char::is_uppercase)
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c, '‘' | '’' | '“' | '”' | '–' | '—' | '…' | '«' | '»' | '·')
}

/// Strip leading and trailing punctuation and whitespace
pub fn trim_punctuation(text: &str) -> &str {
    text.trim_matches(is_trimmable)
}

/// Largest char boundary not past `idx`
pub fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Case-insensitive pattern for a phrase. Internal whitespace matches any
/// whitespace run; word boundaries are enforced on alphanumeric edges.
pub fn phrase_pattern(phrase: &str) -> Option<Regex> {
    let parts: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if parts.is_empty() {
        return None;
    }

    let trimmed = phrase.trim();
    let first = trimmed.chars().next()?;
    let last = trimmed.chars().last()?;
    let lead = if first.is_alphanumeric() { r"\b" } else { "" };
    let trail = if last.is_alphanumeric() { r"\b" } else { "" };

    Regex::new(&format!("(?i){}{}{}", lead, parts.join(r"\s+"), trail)).ok()
}

pub fn overlaps_any(range: &Range<usize>, spans: &[Range<usize>]) -> bool {
    spans.iter().any(|s| range.start < s.end && s.start < range.end)
}

/// First case-insensitive, word-bounded occurrence of `phrase`
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<Range<usize>> {
    find_phrase_outside(haystack, phrase, &[])
}

/// First occurrence of `phrase` not overlapping any protected span
pub fn find_phrase_outside(
    haystack: &str,
    phrase: &str,
    protected: &[Range<usize>],
) -> Option<Range<usize>> {
    let re = phrase_pattern(phrase)?;
    let found = re
        .find_iter(haystack)
        .map(|m| m.range())
        .find(|r| !overlaps_any(r, protected));
    found
}

/// Spans where link text must never be attached: tags, comments,
/// existing anchors, headings, scripts and styles.
pub fn markup_spans(body: &str) -> Vec<Range<usize>> {
    protected_re().find_iter(body).map(|m| m.range()).collect()
}

fn push_trimmed(spans: &mut Vec<Range<usize>>, text: &str, start: usize, end: usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if start + lead < end - trail {
        spans.push(start + lead..end - trail);
    }
}

/// Byte ranges of sentences. A sentence ends at `.`, `!` or `?` followed by
/// whitespace (or the end of text), or at a newline.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            push_trimmed(&mut spans, text, start, end);
            start = end;
        }
    }
    push_trimmed(&mut spans, text, start, text.len());

    spans
}

/// Byte ranges of paragraphs, split on blank lines and `<p>` elements
pub fn paragraph_spans(body: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for m in paragraph_break_re().find_iter(body) {
        push_trimmed(&mut spans, body, cursor, m.start());
        cursor = m.end();
    }
    push_trimmed(&mut spans, body, cursor, body.len());

    spans
}
