//! Filesystem corpus operations.
//!
//! Handles reading and writing the tournament corpus:
//! - Locating the corpus file and caching it by mtime
//! - Merging scraped snapshot files into the corpus
//! - Reading user decklist files

pub mod corpus;
pub mod decklist;
pub mod ingest;

pub use corpus::{read_corpus_file, CorpusCache, CorpusLoad, CorpusSource, CORPUS_PATH_ENV};
pub use decklist::{parse_decklist, read_decklist_file};
pub use ingest::{merge_corpus_files, write_corpus_file, MergeSummary};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid decklist: {0}")]
    InvalidDecklist(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Default corpus file inside the data directory.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("tournament_meta.json")
    }

    /// Where scraper snapshots are dropped before ingest.
    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
