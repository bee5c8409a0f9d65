use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use ingest::Block;

/// Most chapter ids stored on an [`Entity`]
pub const MAX_ENTITY_CHAPTERS: usize = 24;
/// Most evidence snippets stored on an [`Entity`]
pub const MAX_EVIDENCE_SNIPPETS: usize = 2;
/// Most co-occurring entity ids stored on an [`Entity`]
pub const MAX_RELATED_ENTITIES: usize = 5;
/// Characters of context kept on each side of a mention in a snippet
const SNIPPET_CONTEXT: usize = 60;

/// Identifies a block within a book: (chapter id, block id).
pub type BlockKey<'a> = (&'a str, &'a str);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub chapter_id: String,
    pub block_id: String,
    /// Character offset within the block
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    pub id: String,
    pub canonical: String,
    pub variations: BTreeSet<String>,
    pub mentions: Vec<EntityMention>,
    /// Other entity id -> number of times seen within the co-occurrence window
    pub cooccurrences: BTreeMap<String, usize>,
    pub salience: f64,
}

impl EntityCandidate {
    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    /// Distinct chapter ids in order of first mention.
    pub fn chapter_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.mentions
            .iter()
            .filter(|m| seen.insert(m.chapter_id.as_str()))
            .map(|m| m.chapter_id.clone())
            .collect()
    }

    /// Strongest co-occurring entity ids, count descending then id.
    pub fn top_related(&self, limit: usize) -> Vec<String> {
        let mut related: Vec<(&String, usize)> =
            self.cooccurrences.iter().map(|(id, &n)| (id, n)).collect();
        related.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        related
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    pub chapter_id: String,
    pub block_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub canonical: String,
    /// Set by a later labeling step; extraction leaves it empty
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    pub chapter_ids: Vec<String>,
    pub frequency: usize,
    pub evidence: Vec<EvidenceSnippet>,
    pub salience: f64,
    #[serde(default)]
    pub related: Vec<String>,
}

impl Entity {
    /// Convert a candidate, cutting evidence snippets from the blocks it was found in.
    pub fn from_candidate(candidate: &EntityCandidate, blocks: &HashMap<BlockKey<'_>, &Block>) -> Self {
        let mut chapter_ids = candidate.chapter_ids();
        chapter_ids.truncate(MAX_ENTITY_CHAPTERS);

        let mut evidence: Vec<EvidenceSnippet> = Vec::new();
        for mention in &candidate.mentions {
            if evidence.len() >= MAX_EVIDENCE_SNIPPETS {
                break;
            }
            if evidence
                .iter()
                .any(|e| e.chapter_id == mention.chapter_id && e.block_id == mention.block_id)
            {
                continue;
            }
            if let Some(block) = blocks.get(&(mention.chapter_id.as_str(), mention.block_id.as_str())) {
                evidence.push(EvidenceSnippet {
                    chapter_id: mention.chapter_id.clone(),
                    block_id: mention.block_id.clone(),
                    text: snippet(&block.text, mention.offset, mention.text.chars().count()),
                });
            }
        }

        Self {
            id: candidate.id.clone(),
            canonical: candidate.canonical.clone(),
            entity_type: None,
            chapter_ids,
            frequency: candidate.mention_count(),
            evidence,
            salience: candidate.salience,
            related: candidate.top_related(MAX_RELATED_ENTITIES),
        }
    }
}

fn snippet(text: &str, offset: usize, len: usize) -> String {
    let start = offset.saturating_sub(SNIPPET_CONTEXT);
    let end = offset + len + SNIPPET_CONTEXT;
    text.chars()
        .skip(start)
        .take(end - start)
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(chapter: &str, block: &str, offset: usize) -> EntityMention {
        EntityMention {
            chapter_id: chapter.to_string(),
            block_id: block.to_string(),
            offset,
            text: "Ahab".to_string(),
        }
    }

    #[test]
    fn test_candidate_chapters_keep_first_seen_order() {
        let candidate = EntityCandidate {
            id: "ahab".to_string(),
            canonical: "Ahab".to_string(),
            variations: BTreeSet::new(),
            mentions: vec![
                mention("c3", "b1", 0),
                mention("c1", "b2", 0),
                mention("c3", "b1", 10),
            ],
            cooccurrences: BTreeMap::new(),
            salience: 0.5,
        };

        assert_eq!(candidate.chapter_ids(), vec!["c3", "c1"]);
    }

    #[test]
    fn test_entity_caps_chapters_and_evidence() {
        let blocks: Vec<Block> = (0..30)
            .map(|i| Block::new(&format!("c{i}"), 0, "Captain Ahab paced the deck."))
            .collect();
        let mentions = blocks
            .iter()
            .map(|b| EntityMention {
                chapter_id: b.chapter_id.clone(),
                block_id: b.id.clone(),
                offset: 8,
                text: "Ahab".to_string(),
            })
            .collect();
        let candidate = EntityCandidate {
            id: "ahab".to_string(),
            canonical: "Ahab".to_string(),
            variations: BTreeSet::from(["Ahab".to_string()]),
            mentions,
            cooccurrences: BTreeMap::from([
                ("starbuck".to_string(), 2),
                ("moby-dick".to_string(), 7),
            ]),
            salience: 0.9,
        };
        let index: HashMap<BlockKey<'_>, &Block> = blocks
            .iter()
            .map(|b| ((b.chapter_id.as_str(), b.id.as_str()), b))
            .collect();

        let entity = Entity::from_candidate(&candidate, &index);

        assert_eq!(entity.chapter_ids.len(), MAX_ENTITY_CHAPTERS);
        assert_eq!(entity.chapter_ids[0], "c0");
        assert_eq!(entity.chapter_ids[23], "c23");
        assert_eq!(entity.frequency, 30);
        assert_eq!(entity.evidence.len(), MAX_EVIDENCE_SNIPPETS);
        assert_eq!(entity.evidence[0].text, "Captain Ahab paced the deck.");
        assert_eq!(entity.related, vec!["moby-dick", "starbuck"]);
        assert!(entity.entity_type.is_none());
    }

    #[test]
    fn test_snippet_window() {
        let text = format!("{}Ahab{}", "x".repeat(100), "y".repeat(100));
        let cut = snippet(&text, 100, 4);

        assert_eq!(cut.chars().count(), 124);
        assert!(cut.starts_with('x') && cut.ends_with('y'));
    }
}
