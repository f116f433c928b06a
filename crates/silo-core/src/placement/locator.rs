use crate::text::{
    find_phrase_outside, floor_char_boundary, markup_spans, paragraph_spans, related_terms,
    sentence_spans, words,
};
use std::ops::Range;

/// Minimum share of anchor words a sentence must contain to be chosen.
pub const SENTENCE_MATCH_THRESHOLD: f32 = 0.3;

/// Finds where in a body a link for a given anchor belongs.
///
/// Never fails: strategies are tried in order and the last one (the body
/// midpoint) always produces an offset. Offsets are byte offsets on a char
/// boundary and never fall inside a tag or comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionPointLocator;

impl InsertionPointLocator {
    pub fn new() -> Self {
        Self
    }

    pub fn locate(&self, body: &str, anchor: &str) -> usize {
        if body.trim().is_empty() {
            return 0;
        }
        let spans = markup_spans(body);

        let offset = exact_match(body, anchor, &spans)
            .or_else(|| anchor_word(body, anchor, &spans))
            .or_else(|| related_term(body, anchor, &spans))
            .or_else(|| best_sentence(body, anchor))
            .or_else(|| third_paragraph(body))
            .unwrap_or_else(|| floor_char_boundary(body, body.len() / 2));

        clear_of_markup(offset, &spans)
    }
}

fn exact_match(body: &str, anchor: &str, spans: &[Range<usize>]) -> Option<usize> {
    find_phrase_outside(body, anchor, spans).map(|r| r.start)
}

fn anchor_word(body: &str, anchor: &str, spans: &[Range<usize>]) -> Option<usize> {
    words(anchor)
        .into_iter()
        .filter(|w| w.chars().count() > 3)
        .find_map(|w| find_phrase_outside(body, w, spans))
        .map(|r| r.start)
}

fn related_term(body: &str, anchor: &str, spans: &[Range<usize>]) -> Option<usize> {
    words(anchor)
        .into_iter()
        .flat_map(related_terms)
        .find_map(|term| find_phrase_outside(body, term, spans))
        .map(|r| r.start)
}

/// Sentence containing the largest share of anchor words (substring match).
/// Ties go to the earliest sentence.
fn best_sentence(body: &str, anchor: &str) -> Option<usize> {
    let anchor_words: Vec<String> = words(anchor).into_iter().map(str::to_lowercase).collect();
    if anchor_words.is_empty() {
        return None;
    }

    let mut best: Option<(f32, usize)> = None;
    for span in sentence_spans(body) {
        let sentence = body[span.clone()].to_lowercase();
        let hits = anchor_words.iter().filter(|w| sentence.contains(w.as_str())).count();
        let score = hits as f32 / anchor_words.len() as f32;
        if score > SENTENCE_MATCH_THRESHOLD && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, span.start));
        }
    }
    best.map(|(_, start)| start)
}

fn third_paragraph(body: &str) -> Option<usize> {
    let paragraphs = paragraph_spans(body);
    paragraphs
        .get(2)
        .or_else(|| paragraphs.last())
        .map(|r| r.start)
}

/// Move an offset that lands inside a tag or comment to just after it
fn clear_of_markup(offset: usize, spans: &[Range<usize>]) -> usize {
    spans
        .iter()
        .find(|s| s.start < offset && offset < s.end)
        .map_or(offset, |s| s.end)
}
