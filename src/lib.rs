//! # Lorcana Meta
//!
//! Compare Disney Lorcana decklists against a local snapshot of scraped
//! tournament results.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (cards, tournament decks, reports)
//! - **calculate**: Similarity, comparison, suggestions, meta trends, matchups
//! - **storage**: Corpus discovery, mtime cache, snapshot ingest, decklist files
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
