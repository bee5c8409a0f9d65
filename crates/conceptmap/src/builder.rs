use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use extract::{EntityExtractor, ExtractionConfig, TfIdfAnalyzer, TfIdfConfig, TfIdfResult};
use ingest::Chapter;
use themes::{ClusteringConfig, SemanticVectors, ThemeClusterer};

use crate::model::{BookEvent, BuildStats, ConceptMap};

/// Source of build timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant, so repeated builds serialize identically.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub extraction: ExtractionConfig,
    pub tfidf: TfIdfConfig,
    pub clustering: ClusteringConfig,
    /// Above this many chapters the input is probably mis-segmented
    pub degenerate_chapter_count: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            tfidf: TfIdfConfig::default(),
            clustering: ClusteringConfig::default(),
            degenerate_chapter_count: 2000,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate().context("invalid extraction config")?;
        self.clustering.validate().context("invalid clustering config")?;
        if self.tfidf.top_keywords == 0 {
            anyhow::bail!("tfidf.top_keywords must be at least 1");
        }
        Ok(())
    }
}

/// Runs the whole pipeline for one book: keywords, entities, themes.
pub struct ConceptMapBuilder {
    config: BuildConfig,
    semantic: Option<SemanticVectors>,
    events: Vec<BookEvent>,
    tfidf: Option<TfIdfResult>,
    clock: Box<dyn Clock>,
}

impl ConceptMapBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            semantic: None,
            events: Vec::new(),
            tfidf: None,
            clock: Box::new(SystemClock),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Per-chapter embeddings blended into chapter similarity.
    pub fn with_semantic_vectors(mut self, vectors: SemanticVectors) -> Self {
        self.semantic = Some(vectors);
        self
    }

    /// Events produced elsewhere, carried into the map as-is.
    pub fn with_events(mut self, events: Vec<BookEvent>) -> Self {
        self.events = events;
        self
    }

    /// Reuse a precomputed keyword analysis instead of running one.
    pub fn with_tfidf(mut self, tfidf: TfIdfResult) -> Self {
        self.tfidf = Some(tfidf);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn build(self, book_id: &str, chapters: &[Chapter]) -> Result<ConceptMap> {
        self.config.validate()?;
        let started = self.clock.now();

        if chapters.len() > self.config.degenerate_chapter_count {
            tracing::warn!(
                book_id,
                chapters = chapters.len(),
                limit = self.config.degenerate_chapter_count,
                "unusually many chapters, input may be mis-segmented"
            );
        }
        if chapters.is_empty() {
            tracing::warn!(book_id, "book has no chapters, building an empty concept map");
        }

        let tfidf = match self.tfidf {
            Some(tfidf) => tfidf,
            None => TfIdfAnalyzer::new(self.config.tfidf.clone()).analyze(chapters),
        };

        let extractor = EntityExtractor::new(self.config.extraction.clone())
            .context("Failed to create entity extractor")?;
        let candidates = extractor.extract(chapters, Some(&tfidf));
        let entities = extractor.to_entities(&candidates, chapters);

        let semantic = self.semantic.as_ref().filter(|s| !s.is_empty());
        let themes = ThemeClusterer::new(self.config.clustering.clone()).cluster(chapters, &tfidf, semantic);

        let finished = self.clock.now();
        let stats = BuildStats {
            chapter_count: chapters.len(),
            total_blocks: chapters.iter().map(|c| c.blocks.len()).sum(),
            processing_time_ms: (finished - started).num_milliseconds().max(0) as u64,
            used_semantic_vectors: semantic.is_some(),
        };

        tracing::info!(
            book_id,
            entities = entities.len(),
            themes = themes.len(),
            events = self.events.len(),
            elapsed_ms = stats.processing_time_ms,
            "concept map built"
        );

        Ok(ConceptMap::new(book_id, entities, themes, self.events, finished, stats))
    }
}

impl Default for ConceptMapBuilder {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}
