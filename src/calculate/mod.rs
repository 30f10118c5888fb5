//! Deck-vs-meta calculation engine.
//!
//! Pure, request-scoped computations over a loaded corpus:
//! - Card-name normalization and similarity scoring
//! - Meta comparison with placement aggregates
//! - Adds/cuts suggestions from a similarity pool
//! - Archetype and card trend reporting with a diversity score
//! - Heuristic matchup estimates

pub mod analyze;
pub mod archetype;
pub mod compare;
pub mod matchup;
pub mod normalize;
pub mod similarity;
pub mod suggest;

pub use analyze::{AnalyzeOptions, MetaAnalyzer};
pub use archetype::{ArchetypeRules, UNKNOWN_ARCHETYPE};
pub use compare::{CompareOptions, MetaComparator};
pub use matchup::{MatchupEstimate, MatchupTable};
pub use normalize::normalize_card_name;
pub use similarity::{blended_similarity, weighted_jaccard, SimilarityStrategy};
pub use suggest::{suggest_adds_cuts, SuggestOptions};

use thiserror::Error;

/// Errors loading a heuristic data table (keywords, matchups).
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to read rules file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid rules: {0}")]
    Invalid(String),
}
