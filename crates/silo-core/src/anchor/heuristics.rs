//! Heuristic anchor candidates, used when no suggestion is available.
//!
//! Each strategy yields zero or more raw phrases. They are concatenated in
//! strategy order so the selector can walk past a collision into the next
//! best phrase without recomputing anything.

use crate::text::{
    find_phrase, is_capitalized, is_stopword, keywords, significant_words, strip_markup,
    word_windows, words, CONTEXT_PREFIXES, TOPIC_CLUSTERS,
};
use crate::types::Node;
use std::collections::HashSet;

/// The heuristic strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    TitleInBody,
    TitleWindow,
    KeywordOverlap,
    TopicCluster,
    SharedCategory,
    Contextual,
    BareTitle,
}

/// A raw candidate and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub strategy: Strategy,
}

/// Pre-extracted text of a (source, target) pair
pub struct PairText<'a> {
    source_text: String,
    target_text: String,
    source: &'a Node,
    target: &'a Node,
}

impl<'a> PairText<'a> {
    pub fn new(source: &'a Node, target: &'a Node) -> Self {
        Self {
            source_text: strip_markup(&source.body),
            target_text: strip_markup(&target.body),
            source,
            target,
        }
    }

    /// All heuristic candidates, strategy order preserved
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::new();
        let mut push = |strategy: Strategy, texts: Vec<String>| {
            out.extend(texts.into_iter().map(|text| Candidate { text, strategy }));
        };

        push(Strategy::TitleInBody, self.title_in_body());
        push(Strategy::TitleWindow, self.title_windows());
        push(Strategy::KeywordOverlap, self.keyword_overlap());
        push(Strategy::TopicCluster, self.topic_cluster());
        push(Strategy::SharedCategory, self.shared_category());
        push(Strategy::Contextual, self.contextual());
        push(Strategy::BareTitle, vec![self.target.title.trim().to_string()]);

        out
    }

    /// Target title found in the source, capitalisation from the source
    fn title_in_body(&self) -> Vec<String> {
        find_phrase(&self.source_text, &self.target.title)
            .map(|r| vec![self.source_text[r].to_string()])
            .unwrap_or_default()
    }

    /// 3-word then 2-word windows of the title found in the source
    fn title_windows(&self) -> Vec<String> {
        let mut found = Vec::new();
        for n in [3, 2] {
            for window in word_windows(&self.target.title, n) {
                if words(&window).iter().all(|w| is_stopword(w)) {
                    continue;
                }
                if let Some(r) = find_phrase(&self.source_text, &window) {
                    found.push(self.source_text[r].to_string());
                }
            }
        }
        found
    }

    /// Keywords shared by both bodies, title words and proper nouns first
    fn keyword_overlap(&self) -> Vec<String> {
        let source_keywords: HashSet<String> = keywords(&self.source_text).into_iter().collect();
        let title_lower: HashSet<String> = words(&self.target.title)
            .into_iter()
            .map(str::to_lowercase)
            .collect();

        let mut shared: Vec<(bool, bool, String)> = keywords(&self.target_text)
            .into_iter()
            .filter(|k| source_keywords.contains(k))
            .map(|k| {
                let original = self.original_case(&k);
                (!title_lower.contains(&k), !is_capitalized(&original), original)
            })
            .collect();
        if shared.is_empty() {
            return Vec::new();
        }

        shared.sort_by_key(|(not_in_title, not_proper, _)| (*not_in_title, *not_proper));
        let phrase = shared
            .iter()
            .take(3)
            .map(|(_, _, w)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        vec![phrase]
    }

    /// First spelling of a lowercase keyword in the target title or body
    fn original_case(&self, lower: &str) -> String {
        words(&self.target.title)
            .into_iter()
            .chain(words(&self.target_text))
            .find(|w| w.to_lowercase() == lower)
            .map(str::to_string)
            .unwrap_or_else(|| lower.to_string())
    }

    /// Topic clusters present in both bodies
    fn topic_cluster(&self) -> Vec<String> {
        let source_words = lowercase_words(&self.source_text);
        let target_words = lowercase_words(&self.target_text);
        let title: Vec<&str> = words(&self.target.title);

        let mut found = Vec::new();
        for (cluster, terms) in TOPIC_CLUSTERS {
            let in_source = terms.iter().any(|t| source_words.contains(*t));
            let in_target = terms.iter().any(|t| target_words.contains(*t));
            if !(in_source && in_target) {
                continue;
            }

            let hit = title
                .iter()
                .position(|w| terms.contains(&w.to_lowercase().as_str()));
            match hit {
                Some(i) if i + 1 < title.len() => found.push(format!("{} {}", title[i], title[i + 1])),
                Some(i) if i > 0 => found.push(format!("{} {}", title[i - 1], title[i])),
                _ => found.push(format!("{} guide", cluster)),
            }
        }
        found
    }

    /// Category shared by source and target, paired with a title word
    fn shared_category(&self) -> Vec<String> {
        let source_categories: HashSet<String> = self
            .source
            .categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        let Some(category) = self
            .target
            .categories
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty() && source_categories.contains(&c.to_lowercase()))
        else {
            return Vec::new();
        };

        let title_word = significant_words(&self.target.title)
            .into_iter()
            .find(|w| !w.eq_ignore_ascii_case(category));
        match title_word {
            Some(word) => vec![format!("{} {}", category, word)],
            None => vec![format!("{} guide", category)],
        }
    }

    /// Short title, or a prefixed single-word title
    fn contextual(&self) -> Vec<String> {
        let title = words(&self.target.title);
        match title.len() {
            0 => Vec::new(),
            1 => CONTEXT_PREFIXES
                .iter()
                .map(|prefix| format!("{} {}", prefix, title[0]))
                .collect(),
            _ => vec![title.iter().take(4).copied().collect::<Vec<_>>().join(" ")],
        }
    }
}

fn lowercase_words(text: &str) -> HashSet<String> {
    words(text).into_iter().map(str::to_lowercase).collect()
}
