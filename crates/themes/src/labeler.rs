use std::cmp::Ordering;
use std::collections::HashMap;

use extract::TfIdfResult;

/// Keywords used to build a theme label
const LABEL_KEYWORDS: usize = 3;

/// Keywords and label for one cluster of chapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeLabel {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Labels a cluster from its members' cumulative TF-IDF keywords.
pub struct ThemeLabeler {
    keywords_per_theme: usize,
}

impl ThemeLabeler {
    pub fn new(keywords_per_theme: usize) -> Self {
        Self { keywords_per_theme }
    }

    /// Sum member chapters' keyword scores per term and keep the strongest.
    ///
    /// Terms present in every chapter score 0 and rank last, ordered by term.
    /// Only a cluster without any keyword at all gets `fallback`.
    pub fn label_cluster(&self, chapter_ids: &[&str], tfidf: &TfIdfResult, fallback: &str) -> ThemeLabel {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for chapter_id in chapter_ids {
            for keyword in tfidf.keywords_for(chapter_id) {
                *totals.entry(keyword.term.as_str()).or_insert(0.0) += keyword.score;
            }
        }

        let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        let keywords: Vec<String> = ranked
            .into_iter()
            .take(self.keywords_per_theme)
            .map(|(term, _)| term.to_string())
            .collect();

        let label = if keywords.is_empty() {
            fallback.to_string()
        } else {
            keywords
                .iter()
                .take(LABEL_KEYWORDS)
                .map(|k| capitalize(k))
                .collect::<Vec<_>>()
                .join(" & ")
        };

        ThemeLabel { label, keywords }
    }
}

/// Uppercase the first character of every word.
pub fn capitalize(term: &str) -> String {
    term.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
