pub mod builder;
pub mod lookup;
pub mod model;
pub mod store;

pub use builder::{BuildConfig, Clock, ConceptMapBuilder, FixedClock, SystemClock};
pub use lookup::LookupResult;
pub use model::{
    name_from_id, BookEvent, BuildStats, ConceptMap, EvidencePointer, FORMAT_VERSION, MAX_ENTITIES,
    MAX_EVENTS, MAX_THEMES,
};
pub use store::{ConceptMapStore, JsonFileStore, MemoryStore};

use anyhow::Result;
use ingest::Book;

/// Build a concept map for a loaded book with the system clock.
pub fn build_concept_map(book: &Book, config: BuildConfig) -> Result<ConceptMap> {
    ConceptMapBuilder::new(config).build(&book.id, &book.chapters)
}
