pub mod chapter;
pub mod reader;
pub mod splitter;

pub use chapter::{Block, Chapter, BLOCK_SEPARATOR};
pub use reader::BookReader;
pub use splitter::{BlockSplitter, SplitterConfig};

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// A loaded book: its id and ordered chapters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Book {
    pub id: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn total_blocks(&self) -> usize {
        self.chapters.iter().map(|c| c.blocks.len()).sum()
    }
}

/// Generate a stable book ID from its source path
pub fn generate_book_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Load a book from a directory with one text file per chapter
pub async fn load_book(dir_path: &Path) -> Result<Book> {
    let reader = BookReader::default();
    let chapters = reader.read_directory(dir_path).await?;
    let id = generate_book_id(&dir_path.to_string_lossy());

    tracing::info!(book = %id, chapters = chapters.len(), "loaded book");

    Ok(Book { id, chapters })
}
