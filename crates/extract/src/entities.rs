use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use ingest::{Block, Chapter};

use crate::cooccurrence::CooccurrenceCounter;
use crate::normalizer::{entity_id, normalize, EntityNormalizer};
use crate::schema::{BlockKey, Entity, EntityCandidate, EntityMention};
use crate::spans::SpanDetector;
use crate::tfidf::{TfIdfAnalyzer, TfIdfResult};

/// Mentions at which the frequency component saturates
const FREQUENCY_SATURATION: f64 = 50.0;
/// Ceiling on the keyword-importance boost
const MAX_TFIDF_BOOST: f64 = 0.3;
/// TF-IDF scores are divided by this before boosting
const TFIDF_BOOST_SCALE: f64 = 10.0;
/// Salience multiplier for entities seen in fewer than `min_chapters` chapters
const NARROW_SPREAD_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_entities: usize,
    /// Mentions a merged entity needs to be kept
    pub min_mentions: usize,
    /// Chapters an entity needs to escape the spread penalty
    pub min_chapters: usize,
    /// Character distance within which two mentions co-occur
    pub cooccurrence_window: usize,
    pub max_words_per_span: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_entities: 500,
            min_mentions: 3,
            min_chapters: 2,
            cooccurrence_window: 500,
            max_words_per_span: 4,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_entities == 0 {
            anyhow::bail!("max_entities must be at least 1");
        }
        if self.max_words_per_span == 0 {
            anyhow::bail!("max_words_per_span must be at least 1");
        }
        Ok(())
    }
}

/// Inputs to the salience formula for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalienceInputs {
    pub mentions: usize,
    pub chapters: usize,
    pub total_chapters: usize,
    pub tfidf_boost: f64,
}

pub fn frequency_score(mentions: usize) -> f64 {
    (mentions as f64 / FREQUENCY_SATURATION).min(1.0)
}

pub fn spread_score(chapters: usize, total_chapters: usize) -> f64 {
    let expected = (total_chapters as f64 / 3.0).max(1.0);
    (chapters as f64 / expected).min(1.0)
}

/// `(0.4 * frequency + 0.4 * spread + boost) * spread_factor`, clamped to [0, 1].
pub fn salience(inputs: SalienceInputs, min_chapters: usize) -> f64 {
    let base = 0.4 * frequency_score(inputs.mentions)
        + 0.4 * spread_score(inputs.chapters, inputs.total_chapters)
        + inputs.tfidf_boost.min(MAX_TFIDF_BOOST);
    let factor = if inputs.chapters >= min_chapters {
        1.0
    } else {
        NARROW_SPREAD_PENALTY
    };
    (base * factor).clamp(0.0, 1.0)
}

/// Keyword boost for an entity, scaled by 1/10 and capped.
///
/// Each chapter contributes the sum of the TF-IDF scores of the canonical
/// text's words; the boost is the mean of those per-chapter sums over the
/// entity's chapters, so a two-word name can score up to twice what a
/// one-word name does in the same chapters.
pub fn tfidf_boost(canonical: &str, chapter_ids: &[String], tfidf: &TfIdfResult) -> f64 {
    if chapter_ids.is_empty() {
        return 0.0;
    }

    let words = TfIdfAnalyzer::tokenize(&normalize(canonical));
    let total: f64 = chapter_ids
        .iter()
        .map(|chapter| words.iter().map(|w| tfidf.score(chapter, w)).sum::<f64>())
        .sum();
    let average = total / chapter_ids.len() as f64;

    (average / TFIDF_BOOST_SCALE).min(MAX_TFIDF_BOOST)
}

/// Pattern-based entity extraction over a book's chapters.
pub struct EntityExtractor {
    config: ExtractionConfig,
    detector: SpanDetector,
}

impl EntityExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let detector = SpanDetector::new(config.max_words_per_span)?;
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Candidates sorted by descending salience, capped at `max_entities`.
    pub fn extract(&self, chapters: &[Chapter], tfidf: Option<&TfIdfResult>) -> Vec<EntityCandidate> {
        if chapters.is_empty() {
            return Vec::new();
        }

        // Step 1: Collect mentions per surface form
        let mut by_form: BTreeMap<String, Vec<EntityMention>> = BTreeMap::new();
        for chapter in chapters {
            for block in &chapter.blocks {
                for span in self.detector.detect(&block.text) {
                    by_form.entry(span.text.clone()).or_default().push(EntityMention {
                        chapter_id: chapter.id.clone(),
                        block_id: block.id.clone(),
                        offset: span.offset,
                        text: span.text,
                    });
                }
            }
        }

        // Step 2: Merge variations
        let counts: BTreeMap<String, usize> =
            by_form.iter().map(|(form, m)| (form.clone(), m.len())).collect();
        let mut normalizer = EntityNormalizer::new();
        let groups = normalizer.merge_variations(&counts);

        let positions = MentionPositions::new(chapters);

        // Step 3: Build candidates, dropping rare ones
        let mut candidates: Vec<EntityCandidate> = Vec::new();
        for group in groups {
            let mut mentions: Vec<EntityMention> = group
                .variants
                .iter()
                .flat_map(|v| by_form.get(v).cloned().unwrap_or_default())
                .collect();

            if mentions.len() < self.config.min_mentions {
                continue;
            }

            mentions.sort_by_key(|m| positions.sort_key(m));

            candidates.push(EntityCandidate {
                id: entity_id(&group.canonical),
                canonical: group.canonical,
                variations: group.variants.into_iter().collect::<BTreeSet<_>>(),
                mentions,
                cooccurrences: BTreeMap::new(),
                salience: 0.0,
            });
        }

        // Step 4: Co-occurrence within each chapter
        self.count_cooccurrences(chapters, &positions, &mut candidates);

        // Step 5: Salience
        let total_chapters = chapters.len();
        for candidate in &mut candidates {
            let chapter_ids = candidate.chapter_ids();
            let boost = tfidf
                .map(|t| tfidf_boost(&candidate.canonical, &chapter_ids, t))
                .unwrap_or(0.0);
            candidate.salience = salience(
                SalienceInputs {
                    mentions: candidate.mention_count(),
                    chapters: chapter_ids.len(),
                    total_chapters,
                    tfidf_boost: boost,
                },
                self.config.min_chapters,
            );
        }

        candidates.sort_by(|a, b| {
            b.salience
                .partial_cmp(&a.salience)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.mention_count().cmp(&a.mention_count()))
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates.truncate(self.config.max_entities);

        tracing::info!(
            chapters = chapters.len(),
            surface_forms = counts.len(),
            entities = candidates.len(),
            "entity extraction complete"
        );

        candidates
    }

    /// Convert candidates to final entities with evidence snippets.
    pub fn to_entities(&self, candidates: &[EntityCandidate], chapters: &[Chapter]) -> Vec<Entity> {
        let blocks: HashMap<BlockKey<'_>, &Block> = chapters
            .iter()
            .flat_map(|c| c.blocks.iter().map(move |b| ((c.id.as_str(), b.id.as_str()), b)))
            .collect();

        candidates
            .iter()
            .map(|c| Entity::from_candidate(c, &blocks))
            .collect()
    }

    fn count_cooccurrences(
        &self,
        chapters: &[Chapter],
        positions: &MentionPositions<'_>,
        candidates: &mut [EntityCandidate],
    ) {
        let mut counter = CooccurrenceCounter::new(self.config.cooccurrence_window);

        for chapter in chapters {
            let occurrences: Vec<(usize, usize)> = candidates
                .iter()
                .enumerate()
                .flat_map(move |(idx, c)| {
                    c.mentions
                        .iter()
                        .filter(move |m| m.chapter_id == chapter.id)
                        .map(move |m| (positions.chapter_position(m), idx))
                })
                .collect();

            if occurrences.len() > 1 {
                counter.add_chapter(&occurrences);
            }
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        for (a, b, count) in counter.pairs() {
            candidates[a].cooccurrences.insert(ids[b].clone(), count);
            candidates[b].cooccurrences.insert(ids[a].clone(), count);
        }
    }
}

/// Maps a mention's block to its chapter order and character base.
///
/// Block ids only need to be unique within their chapter.
struct MentionPositions<'a> {
    /// (chapter id, block id) -> (chapter index, block index, block start inside chapter text)
    blocks: HashMap<BlockKey<'a>, (usize, usize, usize)>,
}

impl<'a> MentionPositions<'a> {
    fn new(chapters: &'a [Chapter]) -> Self {
        let mut blocks = HashMap::new();
        for (chapter_idx, chapter) in chapters.iter().enumerate() {
            for (block_idx, (block, base)) in
                chapter.blocks.iter().zip(chapter.block_offsets()).enumerate()
            {
                blocks.insert((chapter.id.as_str(), block.id.as_str()), (chapter_idx, block_idx, base));
            }
        }
        Self { blocks }
    }

    fn lookup(&self, mention: &EntityMention) -> Option<(usize, usize, usize)> {
        self.blocks
            .get(&(mention.chapter_id.as_str(), mention.block_id.as_str()))
            .copied()
    }

    fn sort_key(&self, mention: &EntityMention) -> (usize, usize, usize) {
        let (chapter_idx, block_idx, _) = self.lookup(mention).unwrap_or((usize::MAX, usize::MAX, 0));
        (chapter_idx, block_idx, mention.offset)
    }

    fn chapter_position(&self, mention: &EntityMention) -> usize {
        let base = self.lookup(mention).map(|b| b.2).unwrap_or(0);
        base + mention.offset
    }
}
