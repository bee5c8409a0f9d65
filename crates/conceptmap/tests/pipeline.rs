use chrono::{TimeZone, Utc};
use std::collections::BTreeSet;

use conceptmap::{
    BookEvent, BuildConfig, ConceptMapBuilder, ConceptMapStore, FixedClock, JsonFileStore,
    MAX_ENTITIES,
};
use ingest::Chapter;

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 5, 4, 10, 30, 0).unwrap())
}

/// Six-letter capitalized names that never contain one another.
fn name(i: usize) -> String {
    let first = (b'A' + (i % 26) as u8) as char;
    let second = (b'a' + ((i / 26) % 26) as u8) as char;
    format!("{first}{second}orin")
}

fn novel() -> Vec<Chapter> {
    let paragraphs = [
        "The ship sailed at dawn. Everyone aboard watched Captain Ahab on the deck.",
        "Later that morning Ishmael met Queequeg near the harpoon racks.",
        "The whale surfaced twice and Captain Ahab ordered the boats lowered.",
        "Queequeg steadied the boat while Ishmael rowed toward the whale.",
        "By evening the crew spoke only of Moby Dick and the white whale.",
        "Starbuck argued with Captain Ahab about the ship and the voyage.",
        "Ishmael wrote of the sea, of Starbuck, and of the long harbor nights.",
    ];

    (0..6)
        .map(|c| {
            let picked: Vec<&str> = paragraphs.iter().skip(c).take(4).copied().collect();
            Chapter::from_paragraphs(format!("chapter-{}", c + 1), picked)
        })
        .collect()
}

#[test]
fn test_builds_are_byte_identical() {
    let first = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("moby-dick", &novel())
        .unwrap();
    let second = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("moby-dick", &novel())
        .unwrap();

    assert!(!first.entities().is_empty());
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_entities_are_ranked_and_linked() {
    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("moby-dick", &novel())
        .unwrap();

    let saliences: Vec<f64> = map.entities().iter().map(|e| e.salience).collect();
    assert!(saliences.windows(2).all(|w| w[0] >= w[1]));
    assert!(saliences.iter().all(|s| (0.0..=1.0).contains(s)));

    let ahab = map.entity("captain-ahab").unwrap();
    assert!(ahab.frequency >= 3);
    assert!(!ahab.evidence.is_empty());
    assert!(ahab.chapter_ids.iter().all(|c| c.starts_with("chapter-")));
}

#[test]
fn test_entity_cap() {
    // every name appears once in each of three chapters
    let chapters: Vec<Chapter> = (0..3)
        .map(|c| {
            let paragraphs: Vec<String> = (0..600).map(|i| format!("we met {} at the gate.", name(i))).collect();
            Chapter::from_paragraphs(format!("c{c}"), paragraphs)
        })
        .collect();

    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("crowd", &chapters)
        .unwrap();

    assert_eq!(map.entities().len(), MAX_ENTITIES);
    let ids: BTreeSet<&str> = map.entities().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), MAX_ENTITIES);
    assert!(map.entities().iter().all(|e| e.frequency == 3 && e.chapter_ids.len() == 3));
}

#[test]
fn test_theme_floor_and_coverage() {
    let topics = ["ship sail harbor", "garden roses soil", "letter estate dance", "storm thunder rain", "army march battle"];
    let chapters: Vec<Chapter> = (0..30)
        .map(|i| {
            let topic = topics[i % topics.len()];
            Chapter::from_paragraphs(format!("c{i}"), [format!("{topic} {topic} chapter{i} chapter{i}")])
        })
        .collect();

    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("topics", &chapters)
        .unwrap();

    assert!(map.themes().len() >= 25);
    assert!(map.themes().len() <= 30);

    let covered: Vec<&str> = map
        .themes()
        .iter()
        .flat_map(|t| t.chapter_ids.iter().map(String::as_str))
        .collect();
    let unique: BTreeSet<&str> = covered.iter().copied().collect();
    assert_eq!(covered.len(), 30);
    assert_eq!(unique.len(), 30);

    let sizes: Vec<usize> = map.themes().iter().map(|t| t.chapter_ids.len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_lookup_edges() {
    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .with_events(vec![BookEvent::new("ev1").with_participants(["ishmael", "queequeg"])])
        .build("moby-dick", &novel())
        .unwrap();

    assert!(map.lookup("").is_empty());
    assert!(map.lookup("zeppelin").is_empty());

    // Queequeg has only two mid-sentence mentions, so only the event names him
    let queequeg = map.lookup("queequeg");
    assert!(queequeg.entities.is_empty());
    assert_eq!(queequeg.events.len(), 1);

    let result = map.lookup("ishmael");
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].id, "ishmael");
    assert_eq!(result.events.len(), 1);
    assert!(!result.chapter_ids().is_empty());
}

#[test]
fn test_single_chapter_book() {
    let chapters = vec![Chapter::from_paragraphs("c1", ["Paris is beautiful. Paris is old."])];
    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .build("paris", &chapters)
        .unwrap();

    assert_eq!(map.themes().len(), 1);
    assert_eq!(map.themes()[0].chapter_ids, vec!["c1"]);
    assert!(map.themes()[0].keywords.contains(&"paris".to_string()));
    assert!(map.entities().is_empty());

    let result = map.lookup("paris");
    assert_eq!(result.themes.len(), 1);
    assert_eq!(result.chapter_ids(), vec!["c1"]);
}

#[test]
fn test_config_floor_can_be_lowered() {
    let mut config = BuildConfig::default();
    config.clustering.min_themes = 1;
    config.clustering.target_themes = 1;

    let map = ConceptMapBuilder::new(config)
        .with_clock(clock())
        .build("moby-dick", &novel())
        .unwrap();

    // target of one theme forces every merge
    assert_eq!(map.themes().len(), 1);
    assert_eq!(map.themes()[0].chapter_ids.len(), 6);
}

#[tokio::test]
async fn test_load_build_save_reload() {
    let books = tempfile::tempdir().unwrap();
    let chapters = [
        ("01-loomings", "Call me Ishmael.\n\nSome years ago Ishmael went to sea with Queequeg.\n\nLater, Queequeg and Ishmael shared a room."),
        ("02-the-carpet-bag", "The inn was cold.\n\nQueequeg slept while Ishmael read.\n\nAt dawn Queequeg woke Ishmael."),
    ];
    for (file, text) in chapters {
        tokio::fs::write(books.path().join(format!("{file}.txt")), text).await.unwrap();
    }

    let book = ingest::load_book(books.path()).await.unwrap();
    assert_eq!(book.chapters.len(), 2);

    let map = ConceptMapBuilder::default()
        .with_clock(clock())
        .build(&book.id, &book.chapters)
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(out.path());
    store.save(&map).await.unwrap();

    let reloaded = store.load(&book.id).await.unwrap().unwrap();
    assert_eq!(reloaded.book_id(), map.book_id());
    assert_eq!(reloaded.built_at(), map.built_at());
    let ids = |m: &conceptmap::ConceptMap| m.entities().iter().map(|e| e.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&reloaded), ids(&map));
    assert_eq!(reloaded.themes().len(), map.themes().len());
    assert!(reloaded.discusses("ishmael"));
}
