//! Deck similarity scoring.
//!
//! Two formulas are supported and callers pick one explicitly:
//!
//! - [`SimilarityStrategy::Jaccard`]: weighted Jaccard, `Σmin / Σmax`.
//!   Symmetric.
//! - [`SimilarityStrategy::Blended`]: `0.75 × Σmin / |A| + 0.25 × Σmin / Σmax`.
//!   Asymmetric; `A` is the user's deck and recall against it dominates.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::DeckCounts;

/// Which similarity formula to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityStrategy {
    Jaccard,
    #[default]
    Blended,
}

impl SimilarityStrategy {
    /// Score `candidate` against the reference deck `user`. Always in [0, 1].
    pub fn score(&self, user: &DeckCounts, candidate: &DeckCounts) -> f64 {
        match self {
            SimilarityStrategy::Jaccard => weighted_jaccard(user, candidate),
            SimilarityStrategy::Blended => blended_similarity(user, candidate),
        }
    }
}

impl FromStr for SimilarityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jaccard" => Ok(SimilarityStrategy::Jaccard),
            "blended" | "weighted" | "hybrid" => Ok(SimilarityStrategy::Blended),
            other => Err(format!("unknown similarity strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for SimilarityStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityStrategy::Jaccard => write!(f, "jaccard"),
            SimilarityStrategy::Blended => write!(f, "blended"),
        }
    }
}

/// Σmin and Σmax over the union of card keys.
fn overlap(a: &DeckCounts, b: &DeckCounts) -> (u64, u64) {
    let keys: BTreeSet<&str> = a.keys().chain(b.keys()).collect();
    let mut intersection = 0u64;
    let mut union = 0u64;
    for key in keys {
        let qa = a.get(key) as u64;
        let qb = b.get(key) as u64;
        intersection += qa.min(qb);
        union += qa.max(qb);
    }
    (intersection, union)
}

/// Weighted Jaccard similarity. 0 when both decks are empty.
pub fn weighted_jaccard(a: &DeckCounts, b: &DeckCounts) -> f64 {
    let (intersection, union) = overlap(a, b);
    if union == 0 {
        return 0.0;
    }
    (intersection as f64 / union as f64).clamp(0.0, 1.0)
}

/// Recall-weighted blend used for meta comparison.
pub fn blended_similarity(user: &DeckCounts, candidate: &DeckCounts) -> f64 {
    let (intersection, union) = overlap(user, candidate);
    let total_user = user.total();
    if union == 0 || total_user == 0 {
        return 0.0;
    }
    let recall = intersection as f64 / total_user as f64;
    let jaccard = intersection as f64 / union as f64;
    (0.75 * recall + 0.25 * jaccard).clamp(0.0, 1.0)
}
