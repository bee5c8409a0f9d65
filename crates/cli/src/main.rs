mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use conceptmap::{ConceptMap, ConceptMapBuilder, ConceptMapStore, JsonFileStore};
use config::{AppConfig, LoggingConfig};

#[derive(Parser)]
#[command(name = "bookmap")]
#[command(version, about = "Build and query concept maps of books")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE", env = "BOOKMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a concept map from a directory of chapter files
    Build {
        /// Directory with one .txt or .md file per chapter
        dir: PathBuf,

        /// Write the map to this file instead of the configured output directory
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Look a term up in a saved concept map
    Lookup {
        /// Concept map JSON file
        map: PathBuf,

        /// Term to look up (case-insensitive)
        query: String,
    },
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    book_id: &'a str,
    output: String,
    chapters: usize,
    entities: usize,
    themes: usize,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct LookupOutput<'a> {
    query: &'a str,
    entities: Vec<&'a str>,
    themes: Vec<&'a str>,
    events: Vec<String>,
    chapter_ids: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref()).await?;
    if cli.json_logs {
        config.logging.json = true;
    }
    init_tracing(&config.logging);

    match cli.command {
        Command::Build { dir, out } => build(&config, &dir, out.as_deref()).await,
        Command::Lookup { map, query } => lookup(&map, &query).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build(config: &AppConfig, dir: &Path, out: Option<&Path>) -> Result<()> {
    let book = ingest::load_book(dir)
        .await
        .with_context(|| format!("Failed to load book from {}", dir.display()))?;

    let map = ConceptMapBuilder::new(config.build.clone()).build(&book.id, &book.chapters)?;

    let output = match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, map.to_json()?)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path.to_path_buf()
        }
        None => {
            let store = JsonFileStore::new(&config.output.dir);
            store.save(&map).await?;
            store.dir().join(format!("{}.json", map.book_id()))
        }
    };

    let summary = BuildSummary {
        book_id: map.book_id(),
        output: output.display().to_string(),
        chapters: map.stats().chapter_count,
        entities: map.entities().len(),
        themes: map.themes().len(),
        processing_time_ms: map.stats().processing_time_ms,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn lookup(path: &Path, query: &str) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let map = ConceptMap::from_json(&raw)?;

    let result = map.lookup(query);
    if result.is_empty() {
        tracing::info!(query, book_id = map.book_id(), "no matches");
    }

    let mut chapter_ids = result.chapter_ids();
    chapter_ids.sort();

    let output = LookupOutput {
        query,
        entities: result.entities.iter().map(|e| e.canonical.as_str()).collect(),
        themes: result.themes.iter().map(|t| t.label.as_str()).collect(),
        events: result.events.iter().map(|e| e.display_label()).collect(),
        chapter_ids,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from(["bookmap", "build", "books/emma", "--out", "emma.json", "--json-logs"]).unwrap();

        assert!(cli.json_logs);
        match cli.command {
            Command::Build { dir, out } => {
                assert_eq!(dir, PathBuf::from("books/emma"));
                assert_eq!(out, Some(PathBuf::from("emma.json")));
            }
            Command::Lookup { .. } => panic!("expected build"),
        }
    }

    #[tokio::test]
    async fn test_build_then_lookup() {
        let books = tempfile::tempdir().unwrap();
        tokio::fs::write(
            books.path().join("01.txt"),
            "Early on, Emma Woodhouse met Harriet Smith.\n\nLater, Emma Woodhouse advised Harriet Smith.\n\nOnce more, Emma Woodhouse and Harriet Smith walked.",
        )
        .await
        .unwrap();

        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("nested").join("emma.json");
        build(&AppConfig::default(), books.path(), Some(&path)).await.unwrap();

        let map = ConceptMap::from_json(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert!(map.discusses("woodhouse"));
        lookup(&path, "harriet").await.unwrap();
        assert!(lookup(&out.path().join("missing.json"), "emma").await.is_err());
    }
}
