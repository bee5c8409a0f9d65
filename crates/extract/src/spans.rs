use anyhow::{Context, Result};
use regex::Regex;

use crate::stopwords::is_entity_stopword;

/// Honorifics allowed to carry a trailing period inside a span ("Mr. Darcy").
const TITLE_PREFIX: &str = r"(?:(?:Mr|Mrs|Ms|Dr|St|Prof|Rev|Capt|Col|Gen|Lt|Sgt)\.[ \t]+)?";

/// One capitalized word, optionally joined to more letters by an apostrophe or hyphen.
const WORD: &str = r"\p{Lu}\p{L}*(?:['’\-]\p{L}+)*";

/// A capitalized span found in block text.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Character offset of the span inside the scanned text.
    pub offset: usize,
    pub text: String,
}

/// Finds runs of capitalized words that look like proper names.
pub struct SpanDetector {
    pattern: Regex,
}

impl SpanDetector {
    pub fn new(max_words: usize) -> Result<Self> {
        let extra = max_words.max(1) - 1;
        let pattern = format!(r"\b{TITLE_PREFIX}{WORD}(?:[ \t]+{WORD}){{0,{extra}}}");
        let pattern = Regex::new(&pattern).context("Failed to compile span pattern")?;

        Ok(Self { pattern })
    }

    pub fn detect(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        for m in self.pattern.find_iter(text) {
            char_cursor += text[byte_cursor..m.start()].chars().count();
            byte_cursor = m.start();

            let surface = strip_possessive(m.as_str());
            let multi_word = surface.split_whitespace().count() > 1;

            // Single capitalized words after a sentence break are ordinary capitalization
            if !multi_word && at_sentence_start(&text[..m.start()]) {
                continue;
            }

            if surface.is_empty() || is_entity_stopword(&surface.to_lowercase()) {
                continue;
            }

            spans.push(Span {
                offset: char_cursor,
                text: surface.to_string(),
            });
        }

        spans
    }
}

/// True when the text before a match ends a sentence (or is empty).
fn at_sentence_start(preceding: &str) -> bool {
    let trimmed = preceding.trim_end_matches(|c: char| {
        matches!(c, ' ' | '\t' | '\r' | '"' | '\'' | '“' | '‘' | '(' | '[')
    });

    match trimmed.chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | '\n'),
    }
}

fn strip_possessive(span: &str) -> &str {
    span.strip_suffix("'s")
        .or_else(|| span.strip_suffix("’s"))
        .unwrap_or(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[Span]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_titles_and_multi_word_names() {
        let detector = SpanDetector::new(4).unwrap();
        let spans = detector.detect("They danced with Mr. Darcy and Elizabeth Bennet all night.");

        assert_eq!(texts(&spans), vec!["Mr. Darcy", "Elizabeth Bennet"]);
        assert_eq!(spans[0].offset, 17);
    }

    #[test]
    fn test_sentence_initial_single_words_are_dropped() {
        let detector = SpanDetector::new(4).unwrap();
        let spans = detector.detect("Paris is old. Paris is beautiful. We love Paris!\nLondon too.");

        assert_eq!(texts(&spans), vec!["Paris"]);
    }

    #[test]
    fn test_multi_word_span_survives_sentence_start() {
        let detector = SpanDetector::new(4).unwrap();
        let spans = detector.detect("New York was loud.");

        assert_eq!(texts(&spans), vec!["New York"]);
    }

    #[test]
    fn test_stopwords_and_possessives() {
        let detector = SpanDetector::new(4).unwrap();
        let spans = detector.detect("On that Monday we saw Darcy's horse near O'Brien and Anne-Marie.");

        assert_eq!(texts(&spans), vec!["Darcy", "O'Brien", "Anne-Marie"]);
    }

    #[test]
    fn test_word_limit() {
        let detector = SpanDetector::new(2).unwrap();
        let spans = detector.detect("we met John Ronald Reuel Tolkien there");

        assert_eq!(texts(&spans), vec!["John Ronald", "Reuel Tolkien"]);
    }

    #[test]
    fn test_offsets_are_in_characters() {
        let detector = SpanDetector::new(4).unwrap();
        let spans = detector.detect("café with Émile");

        assert_eq!(spans[0].text, "Émile");
        assert_eq!(spans[0].offset, 10);
    }
}
