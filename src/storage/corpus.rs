//! Corpus file discovery and mtime-validated caching.
//!
//! Loading never fails: a missing or malformed corpus yields an empty
//! corpus plus a note explaining why, so comparison degrades gracefully.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::{Corpus, CorpusDocument};

/// Environment variable that overrides every other corpus location.
pub const CORPUS_PATH_ENV: &str = "TOURNAMENT_META_PATH";

/// Ordered list of places the corpus file may live.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusSource {
    candidates: Vec<PathBuf>,
}

impl CorpusSource {
    /// Use exactly these candidates, in order.
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for path in candidates {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { candidates: unique }
    }

    /// Standard search order: `TOURNAMENT_META_PATH`, the configured path,
    /// the data directory, then the working directory.
    pub fn discover(configured: Option<&Path>, storage: &StorageConfig) -> Self {
        let env_path = std::env::var(CORPUS_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self::with_override(env_path, configured, storage)
    }

    fn with_override(
        env_path: Option<String>,
        configured: Option<&Path>,
        storage: &StorageConfig,
    ) -> Self {
        let mut candidates = Vec::new();
        if let Some(path) = env_path {
            candidates.push(PathBuf::from(path.trim()));
        }
        if let Some(path) = configured {
            candidates.push(path.to_path_buf());
        }
        candidates.push(storage.corpus_path());
        candidates.push(PathBuf::from("tournament_meta.json"));
        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists as a file.
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }

    fn searched(&self) -> String {
        self.candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub struct CorpusLoad {
    pub corpus: Arc<Corpus>,
    /// File the corpus came from
    pub path: Option<PathBuf>,
    /// Why the corpus is empty, when it is
    pub note: Option<String>,
}

impl CorpusLoad {
    fn empty(path: Option<PathBuf>, note: String) -> Self {
        Self {
            corpus: Arc::new(Corpus::default()),
            path,
            note: Some(note),
        }
    }
}

#[derive(Debug)]
struct CachedCorpus {
    modified: SystemTime,
    corpus: Arc<Corpus>,
}

/// Parsed corpora keyed by path and validated by modification time.
///
/// Entries are replaced wholesale on refresh; readers holding an older
/// `Arc<Corpus>` keep a consistent snapshot.
#[derive(Debug, Default)]
pub struct CorpusCache {
    entries: RwLock<HashMap<PathBuf, CachedCorpus>>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the corpus from the first existing candidate.
    pub fn load(&self, source: &CorpusSource) -> CorpusLoad {
        let Some(path) = source.resolve() else {
            debug!("No corpus file among: {}", source.searched());
            return CorpusLoad::empty(
                None,
                format!("No tournament meta file found (searched: {})", source.searched()),
            );
        };
        self.load_path(path)
    }

    /// Load a specific corpus file, reusing the cached parse when the file
    /// has not been modified since.
    pub fn load_path(&self, path: &Path) -> CorpusLoad {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Failed to stat corpus {:?}: {}", path, e);
                return CorpusLoad::empty(
                    Some(path.to_path_buf()),
                    format!("Failed to read tournament meta file: {}", e),
                );
            }
        };

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = entries.get(path) {
                if cached.modified == modified {
                    return CorpusLoad {
                        corpus: Arc::clone(&cached.corpus),
                        path: Some(path.to_path_buf()),
                        note: None,
                    };
                }
            }
        }

        match read_corpus_file(path) {
            Ok(corpus) => {
                info!("Loaded {} tournament decks from {:?}", corpus.len(), path);
                let corpus = Arc::new(corpus);
                let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                entries.insert(
                    path.to_path_buf(),
                    CachedCorpus {
                        modified,
                        corpus: Arc::clone(&corpus),
                    },
                );
                CorpusLoad {
                    corpus,
                    path: Some(path.to_path_buf()),
                    note: None,
                }
            }
            Err(e) => {
                warn!("Failed to load corpus {:?}: {}", path, e);
                CorpusLoad::empty(
                    Some(path.to_path_buf()),
                    format!("Failed to load tournament meta file: {}", e),
                )
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read and normalize a corpus file, propagating every failure.
pub fn read_corpus_file(path: &Path) -> Result<Corpus, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let document: CorpusDocument = serde_json::from_str(&contents)?;
    Ok(Corpus::from_document(document))
}
