use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator placed between blocks when a chapter is read as one text.
pub const BLOCK_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub chapter_id: String,
    pub ordinal: usize,
    pub text: String,
}

impl Block {
    pub fn new(chapter_id: &str, ordinal: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        // Generate stable block id from position and content
        let id = Self::generate_block_id(chapter_id, ordinal, &text);

        Self {
            id,
            chapter_id: chapter_id.to_string(),
            ordinal,
            text,
        }
    }

    fn generate_block_id(chapter_id: &str, ordinal: usize, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(chapter_id.as_bytes());
        hasher.update(ordinal.to_string().as_bytes());
        hasher.update(text.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // First 16 bytes (32 hex chars)
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: id.into(),
            title: None,
            blocks,
        }
    }

    /// Build a chapter from paragraph strings, numbering blocks in order.
    pub fn from_paragraphs<I, S>(id: impl Into<String>, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let blocks = paragraphs
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Block::new(&id, ordinal, text))
            .collect();
        Self::new(id, blocks)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// All block text joined with [`BLOCK_SEPARATOR`].
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }

    /// Character position of each block's first character inside `full_text()`.
    pub fn block_offsets(&self) -> Vec<usize> {
        let sep = BLOCK_SEPARATOR.chars().count();
        let mut offsets = Vec::with_capacity(self.blocks.len());
        let mut position = 0;
        for block in &self.blocks {
            offsets.push(position);
            position += block.char_len() + sep;
        }
        offsets
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_is_stable() {
        let a = Block::new("ch1", 0, "It was a dark night.");
        let b = Block::new("ch1", 0, "It was a dark night.");
        let c = Block::new("ch1", 1, "It was a dark night.");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn test_block_offsets_count_characters() {
        let chapter = Chapter::from_paragraphs("ch1", ["Café au lait", "Second"]);

        assert_eq!(chapter.full_text(), "Café au lait\nSecond");
        assert_eq!(chapter.block_offsets(), vec![0, 13]);
    }
}
