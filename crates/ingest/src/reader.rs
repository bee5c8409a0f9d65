use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::chapter::Chapter;
use crate::splitter::BlockSplitter;

pub struct BookReader {
    splitter: BlockSplitter,
}

impl BookReader {
    pub fn new(splitter: BlockSplitter) -> Self {
        Self { splitter }
    }

    pub async fn read_chapter(&self, path: &Path) -> Result<Chapter> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read chapter file: {:?}", path))?;
                let chapter_id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                Ok(self.splitter.split_chapter(&chapter_id, &content))
            }
            _ => anyhow::bail!("Unsupported chapter format: {}", extension),
        }
    }

    /// Read every `.txt`/`.md` file in `dir` as one chapter, ordered by file name.
    pub async fn read_directory(&self, dir: &Path) -> Result<Vec<Chapter>> {
        let mut paths: Vec<PathBuf> = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to list book directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext == "txt" || ext == "md" {
                        paths.push(path);
                    }
                }
            }
        }

        paths.sort();

        let mut chapters = Vec::with_capacity(paths.len());
        for path in paths {
            let chapter = self.read_chapter(&path).await?;
            tracing::debug!(chapter = %chapter.id, blocks = chapter.blocks.len(), "read chapter");
            chapters.push(chapter);
        }

        Ok(chapters)
    }
}

impl Default for BookReader {
    fn default() -> Self {
        Self::new(BlockSplitter::default())
    }
}
