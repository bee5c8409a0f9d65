use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::ConceptMap;

/// Persistence for built concept maps, keyed by book id.
#[allow(async_fn_in_trait)]
pub trait ConceptMapStore {
    async fn save(&self, map: &ConceptMap) -> Result<()>;

    /// `Ok(None)` when no map exists for the book.
    async fn load(&self, book_id: &str) -> Result<Option<ConceptMap>>;

    /// Returns whether a map was removed.
    async fn delete(&self, book_id: &str) -> Result<bool>;
}

/// Process-local store; clones share the same maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    maps: Arc<DashMap<String, ConceptMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl ConceptMapStore for MemoryStore {
    async fn save(&self, map: &ConceptMap) -> Result<()> {
        self.maps.insert(map.book_id().to_string(), map.clone());
        Ok(())
    }

    async fn load(&self, book_id: &str) -> Result<Option<ConceptMap>> {
        Ok(self.maps.get(book_id).map(|r| r.value().clone()))
    }

    async fn delete(&self, book_id: &str) -> Result<bool> {
        Ok(self.maps.remove(book_id).is_some())
    }
}

/// One pretty-printed JSON file per book under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, book_id: &str) -> Result<PathBuf> {
        if book_id.is_empty()
            || book_id == "."
            || book_id == ".."
            || book_id.contains(['/', '\\'])
        {
            anyhow::bail!("invalid book id for file store: {:?}", book_id);
        }
        Ok(self.dir.join(format!("{}.json", book_id)))
    }
}

impl ConceptMapStore for JsonFileStore {
    async fn save(&self, map: &ConceptMap) -> Result<()> {
        let path = self.path_for(map.book_id())?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create store directory {}", self.dir.display()))?;

        let json = map.to_json()?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(book_id = map.book_id(), path = %path.display(), "saved concept map");
        Ok(())
    }

    async fn load(&self, book_id: &str) -> Result<Option<ConceptMap>> {
        let path = self.path_for(book_id)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let map = ConceptMap::from_json(&json).with_context(|| format!("Corrupt concept map at {}", path.display()))?;
        Ok(Some(map))
    }

    async fn delete(&self, book_id: &str) -> Result<bool> {
        let path = self.path_for(book_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}
