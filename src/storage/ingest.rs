//! Merge scraped snapshot files into the corpus.
//!
//! The corpus is append-only: records from each input are added when their
//! fingerprint is new, and the result is written back atomically.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::{read_corpus_file, StorageError};
use crate::models::Corpus;

/// Counts from one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Decks already in the target
    pub existing: usize,
    pub added: usize,
    /// Input decks skipped because the target already had them
    pub duplicates: usize,
    /// Decks in the target after the merge
    pub total: usize,
}

/// Merge every input file into `target`, creating it if needed.
pub fn merge_corpus_files(target: &Path, inputs: &[PathBuf]) -> Result<MergeSummary, StorageError> {
    let mut corpus = if target.exists() {
        read_corpus_file(target)?
    } else {
        debug!("Target {:?} does not exist yet, starting empty", target);
        Corpus::default()
    };

    let mut summary = MergeSummary {
        existing: corpus.len(),
        ..Default::default()
    };

    for input in inputs {
        let incoming = read_corpus_file(input)?;
        if corpus.format.is_none() {
            corpus.format = incoming.format.clone();
        }
        let offered = incoming.len();
        let added = corpus.extend(incoming.decks);
        info!(
            "Merged {:?}: {} new, {} duplicate",
            input,
            added,
            offered - added
        );
        summary.added += added;
        summary.duplicates += offered - added;
    }

    corpus.updated_at = Some(Utc::now().to_rfc3339());
    summary.total = corpus.len();
    write_corpus_file(target, &corpus)?;

    info!(
        "Corpus {:?} now holds {} decks ({} added)",
        target, summary.total, summary.added
    );
    Ok(summary)
}

/// Write a corpus as pretty JSON via a temp file and rename.
pub fn write_corpus_file(path: &Path, corpus: &Corpus) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, corpus)?;
        writeln!(writer)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!("Wrote {} decks to {:?}", corpus.len(), path);
    Ok(())
}
