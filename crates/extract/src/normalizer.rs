use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,!?;:'’]").expect("punctuation pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Normalize entity text: lowercase, drop punctuation, collapse whitespace
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(lowered.trim(), "");
    WHITESPACE.replace_all(stripped.trim(), " ").to_string()
}

/// Deterministic entity id derived from the normalized canonical text.
pub fn entity_id(canonical: &str) -> String {
    normalize(canonical)
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// A set of surface forms that refer to the same entity.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantGroup {
    pub canonical: String,
    /// Surface forms in the order they joined the group.
    pub variants: Vec<String>,
}

/// Groups surface forms by case-insensitive substring containment.
pub struct EntityNormalizer {
    /// Maps surface form -> canonical form of its group
    aliases: HashMap<String, String>,
}

impl EntityNormalizer {
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Merge surface forms (with their mention counts) into variant groups.
    ///
    /// Forms are visited longest first so that full names anchor their group
    /// before shorter forms are attached. A form joins the first existing group
    /// holding a variant that contains it, or that it contains. Groups whose
    /// canonical forms normalize to the same entity id are folded together.
    pub fn merge_variations(&mut self, forms: &BTreeMap<String, usize>) -> Vec<VariantGroup> {
        let mut ordered: Vec<(&String, usize)> = forms.iter().map(|(f, &n)| (f, n)).collect();
        ordered.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.0.cmp(b.0))
        });

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut lowered_groups: Vec<Vec<String>> = Vec::new();

        for (form, _) in ordered {
            let lowered = form.to_lowercase();
            let existing = lowered_groups
                .iter()
                .position(|group| group.iter().any(|v| self.are_similar(&lowered, v)));

            match existing {
                Some(idx) => {
                    groups[idx].push(form.clone());
                    lowered_groups[idx].push(lowered);
                }
                None => {
                    groups.push(vec![form.clone()]);
                    lowered_groups.push(vec![lowered]);
                }
            }
        }

        let mut merged: Vec<VariantGroup> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for variants in groups {
            let canonical = Self::pick_canonical(&variants, forms);
            let id = entity_id(&canonical);

            match by_id.get(&id) {
                Some(&idx) => {
                    let group = &mut merged[idx];
                    group.variants.extend(variants);
                    group.canonical = Self::pick_canonical(&group.variants, forms);
                }
                None => {
                    by_id.insert(id, merged.len());
                    merged.push(VariantGroup { canonical, variants });
                }
            }
        }

        for group in &merged {
            for variant in &group.variants {
                self.aliases.insert(variant.clone(), group.canonical.clone());
            }
        }

        merged
    }

    /// Longest variant wins; ties go to the most mentioned, then lexical order.
    fn pick_canonical(variants: &[String], counts: &BTreeMap<String, usize>) -> String {
        variants
            .iter()
            .max_by(|a, b| {
                a.chars()
                    .count()
                    .cmp(&b.chars().count())
                    .then_with(|| {
                        let ca = counts.get(*a).copied().unwrap_or(0);
                        let cb = counts.get(*b).copied().unwrap_or(0);
                        ca.cmp(&cb)
                    })
                    .then_with(|| b.cmp(a))
            })
            .cloned()
            .unwrap_or_default()
    }

    /// One is contained in the other (handles "Darcy" vs "Mr. Darcy")
    fn are_similar(&self, a: &str, b: &str) -> bool {
        a == b || a.contains(b) || b.contains(a)
    }

    /// Canonical form a surface form was merged into
    pub fn canonical_for(&self, surface: &str) -> Option<&str> {
        self.aliases.get(surface).map(|s| s.as_str())
    }

    /// Get the mapping of all aliases
    pub fn get_aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }
}

impl Default for EntityNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
