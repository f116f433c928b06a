use crate::linker::AnchorConfig;
use crate::text::{is_edge_stopword, is_stopword, strip_markup, trim_punctuation, words};

/// Canonicalise a raw anchor candidate.
///
/// Collapses whitespace, strips punctuation and edge stopwords from both
/// ends, then caps the result to `max_words` words and `max_chars`
/// characters. Returns `None` when no token longer than two characters
/// outside the stopword list survives.
pub fn clean_anchor(raw: &str, config: &AnchorConfig) -> Option<String> {
    let plain = strip_markup(raw);
    let mut tokens: Vec<&str> = plain.split(' ').filter(|t| !t.is_empty()).collect();

    trim_edges(&mut tokens);
    if tokens.len() > config.max_words {
        tokens.truncate(config.max_words);
        trim_edges(&mut tokens);
    }

    let mut text = tokens.join(" ");
    if text.chars().count() > config.max_chars {
        let cut = truncate_chars(&text, config.max_chars);
        let mut tokens: Vec<&str> = cut.split(' ').collect();
        trim_edges(&mut tokens);
        text = tokens.join(" ");
    }

    if has_content_token(&text) {
        Some(text)
    } else {
        None
    }
}

/// Whether some token is longer than two characters and not a stopword
pub fn has_content_token(text: &str) -> bool {
    words(text)
        .into_iter()
        .any(|w| w.chars().count() > 2 && !is_stopword(w))
}

/// Cut to at most `max` characters, dropping a trailing partial word.
fn truncate_chars(text: &str, max: usize) -> String {
    let cut: String = text.chars().take(max).collect();
    let next_is_break = text.chars().nth(max).map_or(true, char::is_whitespace);
    if next_is_break {
        return cut;
    }
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}

fn trim_edges(tokens: &mut Vec<&str>) {
    loop {
        while let Some(&first) = tokens.first() {
            let trimmed = trim_punctuation(first);
            if trimmed.is_empty() {
                tokens.remove(0);
            } else {
                tokens[0] = trimmed;
                break;
            }
        }
        while let Some(&last) = tokens.last() {
            let trimmed = trim_punctuation(last);
            let idx = tokens.len() - 1;
            if trimmed.is_empty() {
                tokens.pop();
            } else {
                tokens[idx] = trimmed;
                break;
            }
        }

        let mut changed = false;
        if tokens.first().map_or(false, |t| is_edge_stopword(t)) {
            tokens.remove(0);
            changed = true;
        }
        if tokens.last().map_or(false, |t| is_edge_stopword(t)) {
            tokens.pop();
            changed = true;
        }
        if !changed {
            break;
        }
    }
}
