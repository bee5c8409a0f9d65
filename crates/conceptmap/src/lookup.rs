use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use extract::Entity;
use themes::Theme;

use crate::model::{name_from_id, BookEvent, ConceptMap};

/// Everything in a concept map matching one query term.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult<'a> {
    /// Sorted by descending salience
    pub entities: Vec<&'a Entity>,
    /// Map order
    pub themes: Vec<&'a Theme>,
    /// Map order
    pub events: Vec<&'a BookEvent>,
    chapter_ids: HashSet<&'a str>,
}

impl<'a> LookupResult<'a> {
    fn empty() -> Self {
        Self {
            entities: Vec::new(),
            themes: Vec::new(),
            events: Vec::new(),
            chapter_ids: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.themes.is_empty() && self.events.is_empty()
    }

    /// Union of the matched items' chapters; order is unspecified.
    pub fn chapter_ids(&self) -> Vec<String> {
        self.chapter_ids.iter().map(|id| id.to_string()).collect()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_ids.len()
    }

    pub fn mentions_chapter(&self, chapter_id: &str) -> bool {
        self.chapter_ids.contains(chapter_id)
    }
}

impl ConceptMap {
    /// Case-insensitive substring lookup across entities, themes and events.
    ///
    /// An entity matches when its canonical text contains the query; a theme
    /// when its label or a keyword does; an event when its display label or a
    /// participant name does.
    ///
    /// Leading and trailing whitespace is trimmed from the query before
    /// matching, so `" darcy "` behaves like `"darcy"`. A query that is empty
    /// after trimming matches nothing.
    pub fn lookup(&self, query: &str) -> LookupResult<'_> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return LookupResult::empty();
        }

        let mut result = LookupResult::empty();

        result.entities = self
            .entities()
            .iter()
            .filter(|e| e.canonical.to_lowercase().contains(&needle))
            .collect();
        result.entities.sort_by(|a, b| {
            b.salience
                .partial_cmp(&a.salience)
                .unwrap_or(Ordering::Equal)
        });

        result.themes = self
            .themes()
            .iter()
            .filter(|t| {
                t.label.to_lowercase().contains(&needle)
                    || t.keywords.iter().any(|k| k.to_lowercase().contains(&needle))
            })
            .collect();

        result.events = self
            .events()
            .iter()
            .filter(|e| self.event_matches(e, &needle))
            .collect();

        let entity_chapters = result.entities.iter().flat_map(|e| e.chapter_ids.iter());
        let theme_chapters = result.themes.iter().flat_map(|t| t.chapter_ids.iter());
        let event_chapters = result.events.iter().flat_map(|e| e.chapter_ids.iter());
        result.chapter_ids = entity_chapters
            .chain(theme_chapters)
            .chain(event_chapters)
            .map(|id| id.as_str())
            .collect();

        tracing::debug!(
            query,
            entities = result.entities.len(),
            themes = result.themes.len(),
            events = result.events.len(),
            chapters = result.chapter_ids.len(),
            "concept map lookup"
        );

        result
    }

    /// True when the book discusses `query` anywhere in the map.
    pub fn discusses(&self, query: &str) -> bool {
        !self.lookup(query).is_empty()
    }

    fn event_matches(&self, event: &BookEvent, needle: &str) -> bool {
        if event.display_label().to_lowercase().contains(needle) {
            return true;
        }

        event.participant_ids.iter().any(|id| {
            let derived = name_from_id(id).to_lowercase();
            let canonical = self.entity(id).map(|e| e.canonical.to_lowercase());
            derived.contains(needle) || canonical.is_some_and(|c| c.contains(needle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildStats;
    use chrono::{TimeZone, Utc};

    fn entity(id: &str, canonical: &str, salience: f64, chapters: &[&str]) -> Entity {
        Entity {
            id: id.to_string(),
            canonical: canonical.to_string(),
            entity_type: None,
            chapter_ids: chapters.iter().map(|c| c.to_string()).collect(),
            frequency: 4,
            evidence: Vec::new(),
            salience,
            related: Vec::new(),
        }
    }

    fn sample_map() -> ConceptMap {
        let entities = vec![
            entity("jane-bennet", "Jane Bennet", 0.4, &["c1", "c2"]),
            entity("elizabeth-bennet", "Elizabeth Bennet", 0.9, &["c1", "c3"]),
            entity("mr-darcy", "Mr. Darcy", 0.8, &["c3", "c4"]),
        ];
        let themes = vec![
            Theme {
                id: "theme-1".to_string(),
                label: "Ball & Dance & Music".to_string(),
                keywords: vec!["ball".to_string(), "dance".to_string(), "music".to_string()],
                chapter_ids: vec!["c5".to_string()],
                cohesion: 0.2,
            },
            Theme {
                id: "theme-2".to_string(),
                label: "Letter & Estate".to_string(),
                keywords: vec!["letter".to_string(), "estate".to_string(), "pemberley".to_string()],
                chapter_ids: vec!["c6".to_string(), "c4".to_string()],
                cohesion: 0.4,
            },
        ];
        let events = vec![
            BookEvent::new("ev1")
                .with_participants(["mr-darcy", "elizabeth-bennet"])
                .with_chapters(["c7"]),
            BookEvent::new("ev2").with_label("The Proposal").with_chapters(["c8"]),
        ];

        ConceptMap::new(
            "pride-and-prejudice",
            entities,
            themes,
            events,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            BuildStats::default(),
        )
    }

    #[test]
    fn test_empty_query_returns_empty_result() {
        let map = sample_map();
        let result = map.lookup("");

        assert!(result.is_empty());
        assert_eq!(result.chapter_count(), 0);
        assert!(map.lookup("   ").is_empty());
    }

    #[test]
    fn test_query_whitespace_is_trimmed() {
        let map = sample_map();
        let padded = map.lookup("  Darcy\t");
        let plain = map.lookup("darcy");

        assert_eq!(padded.entities.len(), 1);
        assert_eq!(padded.entities[0].id, plain.entities[0].id);
        assert_eq!(padded.events.len(), plain.events.len());
    }

    #[test]
    fn test_no_match() {
        let map = sample_map();
        let result = map.lookup("whale");

        assert!(result.is_empty());
        assert!(result.chapter_ids().is_empty());
        assert!(!map.discusses("whale"));
    }

    #[test]
    fn test_entities_sorted_by_salience() {
        let map = sample_map();
        let result = map.lookup("BENNET");

        let ids: Vec<&str> = result.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["elizabeth-bennet", "jane-bennet"]);
        // containment runs one way only: the query must sit inside the text
        assert!(map.lookup("Elizabeth Bennet of Longbourn").entities.is_empty());
    }

    #[test]
    fn test_chapter_union_is_deduplicated() {
        let map = sample_map();
        let result = map.lookup("darcy");

        // Mr. Darcy (c3, c4) and event ev1 (c7) by participant
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.events.len(), 1);
        let mut chapters = result.chapter_ids();
        chapters.sort();
        assert_eq!(chapters, vec!["c3", "c4", "c7"]);
        assert!(result.mentions_chapter("c7"));
    }

    #[test]
    fn test_theme_matches_label_or_keyword() {
        let map = sample_map();

        let by_label = map.lookup("dance");
        assert_eq!(by_label.themes.len(), 1);
        assert_eq!(by_label.themes[0].id, "theme-1");

        let by_keyword = map.lookup("pemberley");
        assert_eq!(by_keyword.themes[0].id, "theme-2");
        assert!(map.discusses("Pemberley"));
    }

    #[test]
    fn test_event_matches_label() {
        let map = sample_map();
        let result = map.lookup("proposal");

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].id, "ev2");
        assert_eq!(result.chapter_ids(), vec!["c8"]);
    }
}
