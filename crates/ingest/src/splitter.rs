use crate::chapter::{Block, Chapter};

pub struct SplitterConfig {
    /// Paragraphs shorter than this (in characters) are folded into the next one.
    pub min_block_chars: usize,
    /// Treat a leading `#` line as the chapter title instead of a block.
    pub detect_title: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            min_block_chars: 1,
            detect_title: true,
        }
    }
}

/// Turns raw chapter text into ordered paragraph blocks.
pub struct BlockSplitter {
    config: SplitterConfig,
}

impl BlockSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    pub fn split_chapter(&self, chapter_id: &str, text: &str) -> Chapter {
        let (title, body) = if self.config.detect_title {
            self.split_title(text)
        } else {
            (None, text)
        };

        let mut blocks = Vec::new();
        let mut buffer = String::new();

        for para in self.split_by_paragraphs(body) {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(&para);

            if buffer.chars().count() >= self.config.min_block_chars {
                blocks.push(Block::new(chapter_id, blocks.len(), std::mem::take(&mut buffer)));
            }
        }

        // Flush remaining buffer
        if !buffer.trim().is_empty() {
            blocks.push(Block::new(chapter_id, blocks.len(), buffer));
        }

        let chapter = Chapter::new(chapter_id, blocks);
        match title {
            Some(title) => chapter.with_title(title),
            None => chapter,
        }
    }

    fn split_title<'a>(&self, text: &'a str) -> (Option<String>, &'a str) {
        let trimmed = text.trim_start();
        if !trimmed.starts_with('#') {
            return (None, text);
        }

        let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
        let title = first_line.trim_start_matches('#').trim();
        if title.is_empty() {
            (None, rest)
        } else {
            (Some(title.to_string()), rest)
        }
    }

    fn split_by_paragraphs(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", "\n");
        normalized
            .split("\n\n")
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for BlockSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}
