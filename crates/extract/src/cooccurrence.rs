use std::collections::BTreeMap;

/// Symmetric co-occurrence counts between entities, keyed by entity index.
#[derive(Debug, Default, Clone)]
pub struct CooccurrenceCounter {
    window: usize,
    counts: BTreeMap<(usize, usize), usize>,
}

impl CooccurrenceCounter {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            counts: BTreeMap::new(),
        }
    }

    /// Count one chapter's occurrences, given as `(character position, entity index)`.
    ///
    /// Every pair of occurrences of distinct entities at most `window`
    /// characters apart increments the pair once.
    pub fn add_chapter(&mut self, occurrences: &[(usize, usize)]) {
        let mut sorted = occurrences.to_vec();
        sorted.sort_unstable();

        for (i, &(pos_a, entity_a)) in sorted.iter().enumerate() {
            for &(pos_b, entity_b) in &sorted[i + 1..] {
                if pos_b - pos_a > self.window {
                    break;
                }
                if entity_a == entity_b {
                    continue;
                }
                let key = (entity_a.min(entity_b), entity_a.max(entity_b));
                *self.counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    pub fn count(&self, a: usize, b: usize) -> usize {
        self.counts
            .get(&(a.min(b), a.max(b)))
            .copied()
            .unwrap_or(0)
    }

    /// All counted pairs with `a < b`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.counts.iter().map(|(&(a, b), &n)| (a, b, n))
    }
}
