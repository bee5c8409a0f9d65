use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use extract::{Entity, MAX_ENTITY_CHAPTERS, MAX_EVIDENCE_SNIPPETS};
use themes::Theme;

pub const MAX_ENTITIES: usize = 500;
pub const MAX_THEMES: usize = 200;
pub const MAX_EVENTS: usize = 500;

/// Version tag written into every concept map.
pub const FORMAT_VERSION: &str = "1.0";

/// Participants named in a generated event label before the rest are counted
const LABEL_PARTICIPANTS: usize = 3;

/// Where an event is attested in the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePointer {
    pub chapter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// An event produced outside the extraction pipeline and carried in the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Entity ids of the participants
    #[serde(default)]
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub chapter_ids: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<EvidencePointer>,
}

impl BookEvent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            participant_ids: Vec::new(),
            chapter_ids: Vec::new(),
            evidence: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_participants<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_chapters<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chapter_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Readable participant names derived from their entity ids.
    pub fn participant_names(&self) -> Vec<String> {
        self.participant_ids.iter().map(|id| name_from_id(id)).collect()
    }

    /// The explicit label, or one built from the participants.
    pub fn display_label(&self) -> String {
        if let Some(label) = self.label.as_deref().filter(|l| !l.trim().is_empty()) {
            return label.to_string();
        }

        let names = self.participant_names();
        let shown = names.len().min(LABEL_PARTICIPANTS);
        let mut label = match &names[..shown] {
            [] => return "Untitled event".to_string(),
            [only] => only.clone(),
            [init @ .., last] => format!("{} & {}", init.join(", "), last),
        };
        if names.len() > shown {
            label.push_str(&format!(" and {} more", names.len() - shown));
        }
        label
    }
}

/// "elizabeth-bennet" -> "Elizabeth Bennet"
pub fn name_from_id(id: &str) -> String {
    id.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub chapter_count: usize,
    pub total_blocks: usize,
    pub processing_time_ms: u64,
    pub used_semantic_vectors: bool,
}

/// Size-capped, immutable index of a book's entities, themes and events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConceptMapParts")]
pub struct ConceptMap {
    book_id: String,
    version: String,
    built_at: DateTime<Utc>,
    stats: BuildStats,
    entities: Vec<Entity>,
    themes: Vec<Theme>,
    events: Vec<BookEvent>,
}

/// Deserialized form; caps are re-applied when converting to [`ConceptMap`].
#[derive(Deserialize)]
struct ConceptMapParts {
    book_id: String,
    version: String,
    built_at: DateTime<Utc>,
    #[serde(default)]
    stats: BuildStats,
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    themes: Vec<Theme>,
    #[serde(default)]
    events: Vec<BookEvent>,
}

impl From<ConceptMapParts> for ConceptMap {
    fn from(parts: ConceptMapParts) -> Self {
        let mut map = ConceptMap::new(
            parts.book_id,
            parts.entities,
            parts.themes,
            parts.events,
            parts.built_at,
            parts.stats,
        );
        map.version = parts.version;
        map
    }
}

impl ConceptMap {
    /// Assemble a map, truncating each collection to its cap (first N kept, order unchanged).
    pub fn new(
        book_id: impl Into<String>,
        mut entities: Vec<Entity>,
        mut themes: Vec<Theme>,
        mut events: Vec<BookEvent>,
        built_at: DateTime<Utc>,
        stats: BuildStats,
    ) -> Self {
        entities.truncate(MAX_ENTITIES);
        themes.truncate(MAX_THEMES);
        events.truncate(MAX_EVENTS);

        for entity in &mut entities {
            entity.chapter_ids.truncate(MAX_ENTITY_CHAPTERS);
            entity.evidence.truncate(MAX_EVIDENCE_SNIPPETS);
        }

        let map = Self {
            book_id: book_id.into(),
            version: FORMAT_VERSION.to_string(),
            built_at,
            stats,
            entities,
            themes,
            events,
        };
        map.debug_assert_caps();
        map
    }

    fn debug_assert_caps(&self) {
        debug_assert!(self.entities.len() <= MAX_ENTITIES);
        debug_assert!(self.themes.len() <= MAX_THEMES);
        debug_assert!(self.events.len() <= MAX_EVENTS);
        debug_assert!(
            self.entities
                .iter()
                .all(|e| e.chapter_ids.len() <= MAX_ENTITY_CHAPTERS)
        );
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn events(&self) -> &[BookEvent] {
        &self.events
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize concept map")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse concept map")
    }
}
