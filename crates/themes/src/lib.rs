pub mod agglomerative;
pub mod labeler;
pub mod similarity;

pub use agglomerative::{AgglomerativeClusterer, StopCriteria};
pub use labeler::{ThemeLabel, ThemeLabeler};
pub use similarity::{dense_cosine, ChapterSimilarity, SemanticVectors};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use extract::{SparseVector, TfIdfAnalyzer, TfIdfResult};
use ingest::Chapter;

/// Chapters at which a theme's cohesion saturates
const COHESION_SATURATION: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub label: String,
    pub keywords: Vec<String>,
    pub chapter_ids: Vec<String>,
    pub cohesion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Hard floor on the number of themes
    pub min_themes: usize,
    /// Theme count at which the distance threshold starts to apply
    pub target_themes: usize,
    pub distance_threshold: f64,
    /// Weight of semantic similarity when both chapters have a vector
    pub semantic_weight: f64,
    pub keywords_per_theme: usize,
    /// Terms in the shared TF-IDF feature space
    pub vocabulary_size: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_themes: 25,
            target_themes: 50,
            distance_threshold: 0.7,
            semantic_weight: 0.7,
            keywords_per_theme: 10,
            vocabulary_size: 100,
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.semantic_weight) {
            anyhow::bail!("semantic_weight must be within [0, 1], got {}", self.semantic_weight);
        }
        if !(0.0..=1.0).contains(&self.distance_threshold) {
            anyhow::bail!(
                "distance_threshold must be within [0, 1], got {}",
                self.distance_threshold
            );
        }
        if self.min_themes > self.target_themes {
            anyhow::bail!(
                "min_themes ({}) must not exceed target_themes ({})",
                self.min_themes,
                self.target_themes
            );
        }
        if self.vocabulary_size == 0 {
            anyhow::bail!("vocabulary_size must be at least 1");
        }
        Ok(())
    }

    fn stop_criteria(&self) -> StopCriteria {
        StopCriteria {
            min_clusters: self.min_themes,
            target_clusters: self.target_themes,
            distance_threshold: self.distance_threshold,
        }
    }
}

/// Groups chapters into labeled themes.
///
/// Similarity-matrix construction is quadratic in chapter count; callers are
/// expected to reject mis-segmented input with thousands of chapters.
pub struct ThemeClusterer {
    config: ClusteringConfig,
}

impl ThemeClusterer {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Themes ordered by descending chapter count.
    pub fn cluster(
        &self,
        chapters: &[Chapter],
        tfidf: &TfIdfResult,
        semantic: Option<&SemanticVectors>,
    ) -> Vec<Theme> {
        let labeler = ThemeLabeler::new(self.config.keywords_per_theme);

        let clusters: Vec<Vec<usize>> = match chapters.len() {
            0 => return Vec::new(),
            1 => vec![vec![0]],
            _ => {
                let similarity = self.similarity_matrix(chapters, tfidf, semantic);
                AgglomerativeClusterer::new(self.config.stop_criteria()).cluster(similarity)
            }
        };

        let mut themes: Vec<Theme> = clusters
            .into_iter()
            .enumerate()
            .map(|(idx, members)| {
                let chapter_ids: Vec<&str> = members.iter().map(|&m| chapters[m].id.as_str()).collect();
                let fallback = format!("Theme {}", idx + 1);
                let ThemeLabel { label, keywords } = labeler.label_cluster(&chapter_ids, tfidf, &fallback);

                Theme {
                    id: String::new(),
                    label,
                    keywords,
                    cohesion: (chapter_ids.len() as f64 / COHESION_SATURATION).min(1.0),
                    chapter_ids: chapter_ids.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        // Stable sort keeps cluster order among equal sizes
        themes.sort_by(|a, b| b.chapter_ids.len().cmp(&a.chapter_ids.len()));
        for (idx, theme) in themes.iter_mut().enumerate() {
            theme.id = format!("theme-{}", idx + 1);
        }

        tracing::info!(chapters = chapters.len(), themes = themes.len(), "theme clustering complete");

        themes
    }

    fn similarity_matrix(
        &self,
        chapters: &[Chapter],
        tfidf: &TfIdfResult,
        semantic: Option<&SemanticVectors>,
    ) -> Vec<Vec<f64>> {
        let analyzer = TfIdfAnalyzer::default();
        let vocabulary = analyzer.build_vocabulary(tfidf, self.config.vocabulary_size);

        let sparse: Vec<SparseVector> = chapters
            .iter()
            .map(|c| analyzer.vectorize(tfidf.keywords_for(&c.id), &vocabulary))
            .collect();
        let dense: Vec<Option<&[f32]>> = chapters
            .iter()
            .map(|c| semantic.and_then(|s| s.get(&c.id)))
            .collect();

        tracing::debug!(
            vocabulary = vocabulary.len(),
            with_vectors = dense.iter().filter(|d| d.is_some()).count(),
            "built chapter feature space"
        );

        ChapterSimilarity::new(self.config.semantic_weight).matrix(&sparse, &dense)
    }
}

impl Default for ThemeClusterer {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}
