use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use extract::SparseVector;

/// Dense per-chapter vectors from an external embedding service, keyed by chapter id.
///
/// Vectors are L2-normalized on insert; empty and all-zero vectors are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticVectors {
    vectors: HashMap<String, Vec<f32>>,
}

impl SemanticVectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chapter_id: impl Into<String>, vector: Vec<f32>) -> bool {
        match l2_normalize(vector) {
            Some(normalized) => {
                self.vectors.insert(chapter_id.into(), normalized);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, chapter_id: &str) -> Option<&[f32]> {
        self.vectors.get(chapter_id).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f32>)> for SemanticVectors {
    fn from_iter<I: IntoIterator<Item = (S, Vec<f32>)>>(iter: I) -> Self {
        let mut vectors = Self::new();
        for (chapter_id, vector) in iter {
            vectors.insert(chapter_id, vector);
        }
        vectors
    }
}

fn l2_normalize(mut vector: Vec<f32>) -> Option<Vec<f32>> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if vector.is_empty() || norm == 0.0 || !norm.is_finite() {
        return None;
    }
    for v in &mut vector {
        *v /= norm;
    }
    Some(vector)
}

/// Cosine similarity of two dense vectors; 0 for mismatched or zero vectors.
pub fn dense_cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Blends TF-IDF and semantic cosine similarity between chapters.
pub struct ChapterSimilarity {
    semantic_weight: f64,
}

impl ChapterSimilarity {
    pub fn new(semantic_weight: f64) -> Self {
        Self { semantic_weight }
    }

    /// Similarity of one chapter pair.
    ///
    /// Uses `w * semantic + (1 - w) * tfidf` when both chapters have a dense
    /// vector, plain TF-IDF cosine otherwise.
    pub fn pair(
        &self,
        sparse_a: &SparseVector,
        sparse_b: &SparseVector,
        dense_a: Option<&[f32]>,
        dense_b: Option<&[f32]>,
    ) -> f64 {
        let tfidf_sim = sparse_a.cosine(sparse_b);
        let blended = match (dense_a, dense_b) {
            (Some(a), Some(b)) => {
                let semantic_sim = dense_cosine(a, b);
                self.semantic_weight * semantic_sim + (1.0 - self.semantic_weight) * tfidf_sim
            }
            _ => tfidf_sim,
        };

        if blended.is_finite() { blended } else { 0.0 }
    }

    /// Full symmetric similarity matrix; the diagonal is 1.
    pub fn matrix(&self, sparse: &[SparseVector], dense: &[Option<&[f32]>]) -> Vec<Vec<f64>> {
        let n = sparse.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            matrix[i][i] = 1.0;
            for j in (i + 1)..n {
                let dense_i = dense.get(i).copied().flatten();
                let dense_j = dense.get(j).copied().flatten();
                let sim = self.pair(&sparse[i], &sparse[j], dense_i, dense_j);
                matrix[i][j] = sim;
                matrix[j][i] = sim;
            }
        }

        matrix
    }
}
