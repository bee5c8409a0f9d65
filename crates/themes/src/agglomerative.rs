use petgraph::unionfind::UnionFind;

/// When agglomerative merging stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCriteria {
    /// Never merge below this many clusters
    pub min_clusters: usize,
    /// At or below this many clusters, stop once the best pair is too far apart
    pub target_clusters: usize,
    /// Distance (`1 - similarity`) above which a pair is too far apart
    pub distance_threshold: f64,
}

/// Average-linkage agglomerative clustering over a similarity matrix.
pub struct AgglomerativeClusterer {
    criteria: StopCriteria,
}

impl AgglomerativeClusterer {
    pub fn new(criteria: StopCriteria) -> Self {
        Self { criteria }
    }

    /// Run clustering
    /// Returns: clusters as item indices, each cluster ascending, clusters in slot order
    ///
    /// A merged cluster keeps the slot of its lower-indexed side, so the
    /// row-major scan for the most similar pair stays deterministic: the first
    /// pair found wins ties.
    pub fn cluster(&self, mut similarity: Vec<Vec<f64>>) -> Vec<Vec<usize>> {
        let n = similarity.len();

        if n == 0 {
            return Vec::new();
        }

        // Initialize: each item in its own cluster
        let mut active: Vec<usize> = (0..n).collect();
        let mut sizes: Vec<usize> = vec![1; n];
        let mut membership: UnionFind<usize> = UnionFind::new(n);
        let mut merges = 0;

        while active.len() > 1 && active.len() > self.criteria.min_clusters {
            let Some((i, j, best)) = Self::most_similar_pair(&active, &similarity) else {
                break;
            };

            if active.len() <= self.criteria.target_clusters
                && 1.0 - best > self.criteria.distance_threshold
            {
                break;
            }

            // Size-weighted average of both sides' similarity to every other cluster
            let (size_i, size_j) = (sizes[i] as f64, sizes[j] as f64);
            for &k in &active {
                if k == i || k == j {
                    continue;
                }
                let merged = (size_i * similarity[i][k] + size_j * similarity[j][k]) / (size_i + size_j);
                similarity[i][k] = merged;
                similarity[k][i] = merged;
            }

            sizes[i] += sizes[j];
            membership.union(i, j);
            active.retain(|&k| k != j);
            merges += 1;

            tracing::debug!(kept = i, absorbed = j, similarity = best, clusters = active.len(), "merged clusters");
        }

        tracing::debug!(items = n, clusters = active.len(), merges, "agglomerative clustering finished");

        active
            .iter()
            .map(|&slot| {
                let root = membership.find(slot);
                (0..n).filter(|&item| membership.find(item) == root).collect()
            })
            .collect()
    }

    /// First pair with the highest similarity in row-major order over active slots.
    fn most_similar_pair(active: &[usize], similarity: &[Vec<f64>]) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;

        for (pos, &i) in active.iter().enumerate() {
            for &j in &active[pos + 1..] {
                let sim = similarity[i][j];
                if best.is_none_or(|(_, _, b)| sim > b) {
                    best = Some((i, j, sim));
                }
            }
        }

        best
    }
}
