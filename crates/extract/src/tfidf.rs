//! Per-chapter TF-IDF keyword and bigram scoring.
//!
//! `tfidf = tf * ln(N / df)` where `tf` is the raw count of a term in the
//! chapter, `N` the number of chapters and `df` the number of chapters that
//! contain the term. A term present in every chapter therefore scores 0.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use ingest::Chapter;

use crate::stopwords::is_english_stopword;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfIdfConfig {
    /// Keywords kept per chapter
    pub top_keywords: usize,
    /// Bigrams kept per chapter
    pub top_bigrams: usize,
    /// Shortest term (in characters) that is scored
    pub min_term_length: usize,
    /// Occurrences a term needs inside a chapter to be scored there
    pub min_term_frequency: usize,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            top_keywords: 50,
            top_bigrams: 30,
            min_term_length: 3,
            min_term_frequency: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    /// Lowercase term (or "first second" for bigrams)
    pub term: String,
    pub score: f64,
    /// Raw count of the term in the chapter
    pub frequency: usize,
    /// Number of chapters containing the term
    pub document_frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterKeywords {
    pub chapter_id: String,
    pub keywords: Vec<KeywordScore>,
    pub bigrams: Vec<KeywordScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfResult {
    /// One entry per analyzed chapter, in input order
    pub chapters: Vec<ChapterKeywords>,
    /// Inverse document frequency of every scored term
    pub idf: BTreeMap<String, f64>,
    pub total_chapters: usize,
}

impl TfIdfResult {
    pub fn keywords_for(&self, chapter_id: &str) -> &[KeywordScore] {
        self.chapters
            .iter()
            .find(|c| c.chapter_id == chapter_id)
            .map(|c| c.keywords.as_slice())
            .unwrap_or(&[])
    }

    pub fn bigrams_for(&self, chapter_id: &str) -> &[KeywordScore] {
        self.chapters
            .iter()
            .find(|c| c.chapter_id == chapter_id)
            .map(|c| c.bigrams.as_slice())
            .unwrap_or(&[])
    }

    /// Score of `term` among a chapter's top keywords, 0 when absent.
    pub fn score(&self, chapter_id: &str, term: &str) -> f64 {
        self.keywords_for(chapter_id)
            .iter()
            .find(|k| k.term == term)
            .map(|k| k.score)
            .unwrap_or(0.0)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }
}

/// Fixed term list defining the dimensions of chapter vectors.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, index }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Sparse vector over a [`Vocabulary`]: dimension index -> weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<usize, f64>,
}

impl SparseVector {
    pub fn insert(&mut self, index: usize, value: f64) {
        self.entries.insert(index, value);
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Cosine similarity; 0 when either vector has zero norm.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.entries.len() <= other.entries.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .entries
            .iter()
            .map(|(idx, v)| v * large.get(*idx))
            .sum();

        let denom = self.norm() * other.norm();
        if denom == 0.0 { 0.0 } else { dot / denom }
    }
}

pub struct TfIdfAnalyzer {
    config: TfIdfConfig,
}

impl TfIdfAnalyzer {
    pub fn new(config: TfIdfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TfIdfConfig {
        &self.config
    }

    /// Score every chapter's keywords and bigrams.
    pub fn analyze(&self, chapters: &[Chapter]) -> TfIdfResult {
        if chapters.is_empty() {
            return TfIdfResult::default();
        }

        let term_lists: Vec<Vec<String>> = chapters
            .iter()
            .map(|c| self.filtered_tokens(&c.full_text()))
            .collect();

        let (keywords, idf) = self.score_chapters(&term_lists, self.config.top_keywords);
        let bigrams = self.extract_bigrams(chapters);

        let chapters_out = chapters
            .iter()
            .zip(keywords)
            .zip(bigrams)
            .map(|((chapter, keywords), bigrams)| ChapterKeywords {
                chapter_id: chapter.id.clone(),
                keywords,
                bigrams,
            })
            .collect();

        tracing::debug!(chapters = chapters.len(), terms = idf.len(), "tf-idf analysis complete");

        TfIdfResult {
            chapters: chapters_out,
            idf,
            total_chapters: chapters.len(),
        }
    }

    /// Top bigrams per chapter, in chapter order.
    pub fn extract_bigrams(&self, chapters: &[Chapter]) -> Vec<Vec<KeywordScore>> {
        let bigram_lists: Vec<Vec<String>> = chapters
            .iter()
            .map(|c| {
                let tokens = self.filtered_tokens(&c.full_text());
                tokens
                    .windows(2)
                    .map(|pair| format!("{} {}", pair[0], pair[1]))
                    .collect()
            })
            .collect();

        self.score_chapters(&bigram_lists, self.config.top_bigrams).0
    }

    /// Rank terms by summed TF-IDF across chapters and keep the top `size`.
    pub fn build_vocabulary(&self, result: &TfIdfResult, size: usize) -> Vocabulary {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for chapter in &result.chapters {
            for keyword in &chapter.keywords {
                *totals.entry(keyword.term.as_str()).or_insert(0.0) += keyword.score;
            }
        }

        let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| by_score_then_term(a.1, a.0, b.1, b.0));

        Vocabulary::new(
            ranked
                .into_iter()
                .take(size)
                .map(|(term, _)| term.to_string())
                .collect(),
        )
    }

    /// Project a chapter's keywords onto the vocabulary; unknown terms are dropped.
    pub fn vectorize(&self, keywords: &[KeywordScore], vocabulary: &Vocabulary) -> SparseVector {
        let mut vector = SparseVector::default();
        for keyword in keywords {
            if let Some(idx) = vocabulary.index_of(&keyword.term) {
                vector.insert(idx, keyword.score);
            }
        }
        vector
    }

    /// Lowercase alphabetic runs.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphabetic())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    }

    fn filtered_tokens(&self, text: &str) -> Vec<String> {
        Self::tokenize(text)
            .into_iter()
            .filter(|t| t.chars().count() >= self.config.min_term_length && !is_english_stopword(t))
            .collect()
    }

    /// Shared scoring for unigram and bigram term lists.
    fn score_chapters(
        &self,
        term_lists: &[Vec<String>],
        top_n: usize,
    ) -> (Vec<Vec<KeywordScore>>, BTreeMap<String, f64>) {
        let total = term_lists.len() as f64;

        let counts: Vec<HashMap<&str, usize>> = term_lists
            .iter()
            .map(|terms| {
                let mut counts = HashMap::new();
                for term in terms {
                    *counts.entry(term.as_str()).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for chapter_counts in &counts {
            let unique: BTreeSet<&str> = chapter_counts.keys().copied().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let idf: BTreeMap<String, f64> = document_frequency
            .iter()
            .map(|(term, &df)| (term.to_string(), (total / df as f64).ln()))
            .collect();

        let scored = counts
            .iter()
            .map(|chapter_counts| {
                let mut keywords: Vec<KeywordScore> = chapter_counts
                    .iter()
                    .filter(|(_, count)| **count >= self.config.min_term_frequency)
                    .map(|(term, &count)| {
                        let df = document_frequency[term];
                        let term_idf = idf.get(*term).copied().unwrap_or(0.0);
                        KeywordScore {
                            term: term.to_string(),
                            score: count as f64 * term_idf,
                            frequency: count,
                            document_frequency: df,
                        }
                    })
                    .collect();

                keywords.sort_by(|a, b| by_score_then_term(a.score, &a.term, b.score, &b.term));
                keywords.truncate(top_n);
                keywords
            })
            .collect();

        (scored, idf)
    }
}

impl Default for TfIdfAnalyzer {
    fn default() -> Self {
        Self::new(TfIdfConfig::default())
    }
}

/// Descending score, ascending term on ties.
fn by_score_then_term(score_a: f64, term_a: &str, score_b: f64, term_b: &str) -> Ordering {
    score_b
        .partial_cmp(&score_a)
        .unwrap_or(Ordering::Equal)
        .then_with(|| term_a.cmp(term_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: &str, text: &str) -> Chapter {
        Chapter::from_paragraphs(id, [text])
    }

    #[test]
    fn test_term_in_every_chapter_scores_zero() {
        let chapters = vec![
            chapter("c1", "whale whale whale ocean ocean harpoon"),
            chapter("c2", "whale whale garden garden roses roses"),
            chapter("c3", "whale whale whale whale whale desert desert"),
        ];
        let result = TfIdfAnalyzer::default().analyze(&chapters);

        assert_eq!(result.total_chapters, 3);
        assert_eq!(result.idf("whale"), Some(0.0));
        for c in &chapters {
            assert_eq!(result.score(&c.id, "whale"), 0.0);
        }
        let whale = result
            .keywords_for("c3")
            .iter()
            .find(|k| k.term == "whale")
            .unwrap();
        assert_eq!(whale.frequency, 5);
        assert_eq!(whale.score, 0.0);
    }

    #[test]
    fn test_scores_use_raw_frequency() {
        let chapters = vec![
            chapter("c1", "ocean ocean ocean harpoon"),
            chapter("c2", "garden garden"),
        ];
        let result = TfIdfAnalyzer::default().analyze(&chapters);

        let ocean = &result.keywords_for("c1")[0];
        assert_eq!(ocean.term, "ocean");
        assert_eq!(ocean.frequency, 3);
        assert_eq!(ocean.document_frequency, 1);
        assert!((ocean.score - 3.0 * 2f64.ln()).abs() < 1e-12);

        // single occurrence is below the frequency floor
        assert_eq!(result.score("c1", "harpoon"), 0.0);
        assert!(result.keywords_for("c1").iter().all(|k| k.term != "harpoon"));
    }

    #[test]
    fn test_short_words_and_stopwords_are_excluded() {
        let chapters = vec![
            chapter("c1", "the the the ox ox ox ship ship"),
            chapter("c2", "nothing here"),
        ];
        let result = TfIdfAnalyzer::default().analyze(&chapters);
        let terms: Vec<&str> = result.keywords_for("c1").iter().map(|k| k.term.as_str()).collect();

        assert_eq!(terms, vec!["ship"]);
    }

    #[test]
    fn test_bigrams_skip_stopwords() {
        let chapters = vec![
            chapter("c1", "the white whale and the white whale swam. white whale!"),
            chapter("c2", "quiet garden"),
        ];
        let result = TfIdfAnalyzer::default().analyze(&chapters);
        let bigrams = result.bigrams_for("c1");

        assert_eq!(bigrams[0].term, "white whale");
        assert_eq!(bigrams[0].frequency, 3);
    }

    #[test]
    fn test_vocabulary_and_vectorize() {
        let chapters = vec![
            chapter("c1", "ship ship ship sail sail"),
            chapter("c2", "garden garden rose rose rose rose"),
            chapter("c3", "ship ship storm storm"),
        ];
        let analyzer = TfIdfAnalyzer::default();
        let result = analyzer.analyze(&chapters);
        let vocabulary = analyzer.build_vocabulary(&result, 3);

        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.terms()[0], "rose");

        let vector = analyzer.vectorize(result.keywords_for("c2"), &vocabulary);
        let rose = vocabulary.index_of("rose").unwrap();
        assert!(vector.get(rose) > 0.0);
        assert!(vector.len() <= 2);
    }

    #[test]
    fn test_cosine() {
        let mut a = SparseVector::default();
        a.insert(0, 1.0);
        a.insert(1, 1.0);
        let mut b = SparseVector::default();
        b.insert(1, 2.0);

        assert!((a.cosine(&b) - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(a.cosine(&SparseVector::default()), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let result = TfIdfAnalyzer::default().analyze(&[]);
        assert!(result.chapters.is_empty());
        assert_eq!(result.total_chapters, 0);
    }
}
