pub mod cooccurrence;
pub mod entities;
pub mod normalizer;
pub mod schema;
pub mod spans;
pub mod stopwords;
pub mod tfidf;

pub use entities::{EntityExtractor, ExtractionConfig, SalienceInputs};
pub use normalizer::{entity_id, EntityNormalizer, VariantGroup};
pub use schema::{
    BlockKey, Entity, EntityCandidate, EntityMention, EvidenceSnippet, MAX_ENTITY_CHAPTERS,
    MAX_EVIDENCE_SNIPPETS,
};
pub use tfidf::{
    ChapterKeywords, KeywordScore, SparseVector, TfIdfAnalyzer, TfIdfConfig, TfIdfResult,
    Vocabulary,
};
