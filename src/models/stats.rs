//! Derived statistics models.
//!
//! Everything here is recomputed per request and never persisted.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DeckFingerprint, TournamentDeck};

/// Direction of a share change between the week and month windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    /// Classify a percentage-point change against a symmetric threshold.
    pub fn from_change(change: f64, threshold: f64) -> Self {
        if change > threshold {
            Trend::Rising
        } else if change < -threshold {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Falling => write!(f, "falling"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Suggestion priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// Overall meta health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthLabel {
    Concentrated,
    Limited,
    Developing,
    Healthy,
}

impl HealthLabel {
    /// Classify from the top archetype share (%), viable archetype count and
    /// diversity (0-100). Checks run in that order.
    pub fn classify(concentration: f64, viable_archetypes: usize, diversity: f64) -> Self {
        if concentration > 40.0 {
            HealthLabel::Concentrated
        } else if viable_archetypes <= 3 {
            HealthLabel::Limited
        } else if diversity < 50.0 {
            HealthLabel::Developing
        } else {
            HealthLabel::Healthy
        }
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthLabel::Concentrated => write!(f, "Concentrated"),
            HealthLabel::Limited => write!(f, "Limited"),
            HealthLabel::Developing => write!(f, "Developing"),
            HealthLabel::Healthy => write!(f, "Healthy"),
        }
    }
}

/// A corpus deck scored against the user's deck.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarDeck {
    pub deck: TournamentDeck,
    pub score: f64,
    pub placement: Option<u32>,
    pub archetype: String,
    pub fingerprint: DeckFingerprint,
}

/// Placement statistics over a filtered candidate set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub count: usize,
    pub best_finish: Option<u32>,
    pub avg_finish: Option<f64>,
    pub top8_rate: Option<f64>,
    pub by_archetype: BTreeMap<String, usize>,
}

/// Result of comparing one decklist against the corpus.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Comparison switched on in configuration
    pub enabled: bool,
    /// Corpus loaded with at least one deck
    pub available: bool,
    pub similar_decks: Vec<SimilarDeck>,
    pub aggregate: AggregateStats,
    /// Number of decks left after filtering
    pub compared_count: usize,
    pub note: Option<String>,
}

impl ComparisonReport {
    pub fn disabled(note: impl Into<String>) -> Self {
        Self {
            enabled: false,
            available: false,
            similar_decks: Vec::new(),
            aggregate: AggregateStats::default(),
            compared_count: 0,
            note: Some(note.into()),
        }
    }

    pub fn unavailable(note: Option<String>) -> Self {
        Self {
            enabled: true,
            available: false,
            similar_decks: Vec::new(),
            aggregate: AggregateStats::default(),
            compared_count: 0,
            note: note.or_else(|| Some("No tournament decks available".to_string())),
        }
    }
}

/// A single add or cut recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Display name
    pub name: String,
    /// Normalized join key
    pub key: String,
    /// Share of pool decks running the card (0-100)
    pub presence: f64,
    /// Weighted mean copies among pool decks running the card
    pub avg_copies: f64,
    pub current_qty: u32,
    pub suggested_qty: u32,
    pub priority: Priority,
    pub reason: String,
}

/// Adds and cuts derived from a similarity pool.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionReport {
    pub adds: Vec<Suggestion>,
    pub cuts: Vec<Suggestion>,
    pub pool_size: usize,
}

/// Share and trend for one archetype.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeTrend {
    pub archetype: String,
    /// Share of last-7-days decks (%)
    pub week_share: f64,
    /// Share of last-30-days decks (%)
    pub month_share: f64,
    /// week_share - month_share, in points
    pub change: f64,
    pub trend: Trend,
    pub avg_placement: Option<f64>,
    /// Decks across the whole corpus
    pub deck_count: usize,
}

/// Presence and trend for one card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTrend {
    pub name: String,
    pub key: String,
    pub week_presence: f64,
    pub month_presence: f64,
    pub change: f64,
    pub trend: Trend,
    pub avg_copies: f64,
}

/// Diversity summary of the archetype distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaHealth {
    /// Normalized Shannon entropy, 0-100
    pub diversity: f64,
    /// Top archetype share (%)
    pub concentration: f64,
    /// Archetypes with at least 5% share
    pub viable_archetypes: usize,
    pub health: HealthLabel,
}

/// Deck counts per time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCounts {
    pub week: usize,
    pub month: usize,
    pub all: usize,
}

/// Archetype and card trends across the corpus.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReport {
    pub total_decks: usize,
    pub windows: WindowCounts,
    /// No parsable dates; all windows are the whole corpus
    pub snapshot: bool,
    pub reference_date: Option<NaiveDate>,
    pub format: Option<String>,
    pub archetypes: Vec<ArchetypeTrend>,
    pub cards: Vec<CardTrend>,
    pub health: MetaHealth,
}

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
