//! Heuristic matchup estimates.
//!
//! A static win-rate table between archetypes, nudged by per-card deltas
//! when the user's deck runs specific answers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{normalize_card_name, RulesError};
use crate::models::{round_to, title_case, DeckCounts};

const BUILTIN_MATCHUPS: &str = include_str!("../../data/matchups.toml");

/// Estimates never leave this band.
pub const MIN_WIN_RATE: f64 = 0.05;
pub const MAX_WIN_RATE: f64 = 0.95;
/// Win rate reported for pairs the table knows nothing about.
pub const NEUTRAL_WIN_RATE: f64 = 0.5;

const FULL_PLAYSET: f64 = 4.0;

#[derive(Debug, Deserialize)]
struct MatchupFile {
    #[serde(default)]
    matchup: Vec<MatchupRow>,
    #[serde(default)]
    card_adjustment: Vec<AdjustmentRow>,
}

#[derive(Debug, Deserialize)]
struct MatchupRow {
    archetype: String,
    opponent: String,
    win_rate: f64,
}

#[derive(Debug, Deserialize)]
struct AdjustmentRow {
    card: String,
    opponent: String,
    delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct CardAdjustment {
    /// Display name
    card: String,
    /// Normalized card key
    key: String,
    delta: f64,
}

/// A card delta that contributed to an estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    pub card: String,
    pub copies: u32,
    /// Delta after scaling by copies
    pub delta: f64,
}

/// Estimated win rate of one archetype into one opponent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupEstimate {
    pub archetype: String,
    pub opponent: String,
    /// Table rate before card adjustments
    pub base_rate: f64,
    pub win_rate: f64,
    /// The pair (or its reverse) is in the table
    pub known: bool,
    pub adjustments: Vec<AppliedAdjustment>,
}

/// Archetype-vs-archetype win rates plus card nudges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupTable {
    rates: BTreeMap<(String, String), f64>,
    adjustments: BTreeMap<String, Vec<CardAdjustment>>,
}

impl MatchupTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_MATCHUPS).unwrap_or_default()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RulesError> {
        let file: MatchupFile = toml::from_str(contents)?;
        let mut table = MatchupTable::default();

        for row in file.matchup {
            if !(0.0..=1.0).contains(&row.win_rate) {
                return Err(RulesError::Invalid(format!(
                    "win_rate {} for {} vs {} is outside [0, 1]",
                    row.win_rate, row.archetype, row.opponent
                )));
            }
            let archetype = archetype_key(&row.archetype);
            let opponent = archetype_key(&row.opponent);
            if archetype.is_empty() || opponent.is_empty() {
                return Err(RulesError::Invalid("empty archetype name".to_string()));
            }
            table.rates.insert((archetype, opponent), row.win_rate);
        }

        for row in file.card_adjustment {
            if !(-0.5..=0.5).contains(&row.delta) {
                return Err(RulesError::Invalid(format!(
                    "delta {} for {} is outside [-0.5, 0.5]",
                    row.delta, row.card
                )));
            }
            let key = normalize_card_name(&row.card);
            let opponent = archetype_key(&row.opponent);
            if key.is_empty() || opponent.is_empty() {
                return Err(RulesError::Invalid("empty card or opponent name".to_string()));
            }
            table.adjustments.entry(opponent).or_default().push(CardAdjustment {
                card: row.card.trim().to_string(),
                key,
                delta: row.delta,
            });
        }

        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        debug!(
            "Loaded {} matchups and {} card adjustments from {:?}",
            table.rates.len(),
            table.adjustments.values().map(Vec::len).sum::<usize>(),
            path
        );
        Ok(table)
    }

    /// Every archetype named in the table, sorted.
    pub fn archetypes(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .rates
            .keys()
            .flat_map(|(a, b)| [a, b])
            .collect();
        names.into_iter().cloned().collect()
    }

    /// Base rate for a pair, and whether the table knows it.
    pub fn base_rate(&self, archetype: &str, opponent: &str) -> (f64, bool) {
        let a = archetype_key(archetype);
        let b = archetype_key(opponent);
        if let Some(rate) = self.rates.get(&(a.clone(), b.clone())) {
            return (*rate, true);
        }
        if let Some(rate) = self.rates.get(&(b, a)) {
            return (1.0 - rate, true);
        }
        (NEUTRAL_WIN_RATE, false)
    }

    /// Estimate `archetype` (played with `counts`) into `opponent`.
    pub fn estimate(&self, archetype: &str, counts: &DeckCounts, opponent: &str) -> MatchupEstimate {
        let (base_rate, known) = self.base_rate(archetype, opponent);
        let opponent_key = archetype_key(opponent);

        let mut applied = Vec::new();
        if let Some(adjustments) = self.adjustments.get(&opponent_key) {
            for adjustment in adjustments {
                let copies = counts.get(&adjustment.key);
                if copies == 0 {
                    continue;
                }
                let scale = (copies as f64 / FULL_PLAYSET).min(1.0);
                applied.push(AppliedAdjustment {
                    card: adjustment.card.clone(),
                    copies,
                    delta: round_to(adjustment.delta * scale, 4),
                });
            }
        }

        let total: f64 = applied.iter().map(|a| a.delta).sum();
        let win_rate = round_to((base_rate + total).clamp(MIN_WIN_RATE, MAX_WIN_RATE), 3);

        MatchupEstimate {
            archetype: archetype_key(archetype),
            opponent: opponent_key,
            base_rate: round_to(base_rate, 3),
            win_rate,
            known,
            adjustments: applied,
        }
    }

    /// Estimates against every other archetype in the table, best first.
    pub fn matchups_for(&self, archetype: &str, counts: &DeckCounts) -> Vec<MatchupEstimate> {
        let own = archetype_key(archetype);
        let mut estimates: Vec<MatchupEstimate> = self
            .archetypes()
            .into_iter()
            .filter(|opponent| *opponent != own)
            .map(|opponent| self.estimate(&own, counts, &opponent))
            .collect();

        estimates.sort_by(|a, b| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.opponent.cmp(&b.opponent))
        });
        estimates
    }
}

/// Canonical archetype label: ink pairs are order-insensitive, so
/// "steel/amber" and "Amber / Steel" both become "Amber/Steel".
pub fn archetype_key(name: &str) -> String {
    let mut parts: Vec<String> = name
        .split('/')
        .map(|part| title_case(part.trim()))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() > 1 {
        parts.sort();
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counts(cards: &[(&str, i64)]) -> DeckCounts {
        DeckCounts::from_pairs(cards.iter().map(|(n, q)| (*n, *q)))
    }

    #[test]
    fn test_builtin_table_parses() {
        let table = MatchupTable::from_toml_str(BUILTIN_MATCHUPS).unwrap();
        assert!(table.archetypes().contains(&"Amber/Steel".to_string()));
        assert!(table.archetypes().len() >= 6);
    }

    #[test]
    fn test_archetype_key() {
        assert_eq!(archetype_key("steel/amber"), "Amber/Steel");
        assert_eq!(archetype_key(" Amber / Steel "), "Amber/Steel");
        assert_eq!(archetype_key("steelsong"), "Steelsong");
        assert_eq!(archetype_key(""), "");
    }

    #[test]
    fn test_lookup_is_order_insensitive_and_reversible() {
        let table = MatchupTable::builtin();
        assert_eq!(table.base_rate("Steel/Amber", "Sapphire/Ruby"), (0.55, true));

        let (reverse, known) = table.base_rate("Ruby/Sapphire", "Amber/Steel");
        assert!(known);
        assert!((reverse - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_pair_is_neutral() {
        let table = MatchupTable::builtin();
        let estimate = table.estimate("Mystery Pile", &DeckCounts::default(), "Amber/Steel");
        assert!(!estimate.known);
        assert_eq!(estimate.win_rate, 0.5);
        assert!(estimate.adjustments.is_empty());
    }

    #[test]
    fn test_card_adjustment_scales_with_copies() {
        let table = MatchupTable::from_toml_str(
            r#"
[[matchup]]
archetype = "Ruby/Sapphire"
opponent = "Amber/Steel"
win_rate = 0.5

[[card_adjustment]]
card = "Brawl"
opponent = "Amber/Steel"
delta = 0.08
"#,
        )
        .unwrap();

        let two = table.estimate("Ruby/Sapphire", &counts(&[("Brawl", 2)]), "Amber/Steel");
        assert_eq!(two.win_rate, 0.54);
        assert_eq!(two.base_rate, 0.5);
        assert_eq!(
            two.adjustments,
            vec![AppliedAdjustment {
                card: "Brawl".to_string(),
                copies: 2,
                delta: 0.04,
            }]
        );

        let four = table.estimate("Ruby/Sapphire", &counts(&[("brawl", 4)]), "Amber/Steel");
        assert_eq!(four.win_rate, 0.58);

        let none = table.estimate("Ruby/Sapphire", &counts(&[("Pluto", 4)]), "Amber/Steel");
        assert_eq!(none.win_rate, 0.5);
    }

    #[test]
    fn test_estimate_is_clamped() {
        let table = MatchupTable::from_toml_str(
            r#"
[[matchup]]
archetype = "A"
opponent = "B"
win_rate = 0.94

[[card_adjustment]]
card = "Big Answer"
opponent = "B"
delta = 0.3
"#,
        )
        .unwrap();
        let estimate = table.estimate("A", &counts(&[("Big Answer", 4)]), "B");
        assert_eq!(estimate.win_rate, MAX_WIN_RATE);

        let reverse = MatchupTable::from_toml_str("[[matchup]]\narchetype = \"A\"\nopponent = \"B\"\nwin_rate = 1.0\n")
            .unwrap()
            .estimate("B", &DeckCounts::default(), "A");
        assert_eq!(reverse.win_rate, MIN_WIN_RATE);
    }

    #[test]
    fn test_matchups_for_sorted_best_first() {
        let table = MatchupTable::builtin();
        let estimates = table.matchups_for("Amber/Steel", &DeckCounts::default());

        assert!(!estimates.is_empty());
        assert!(estimates.iter().all(|e| e.opponent != "Amber/Steel"));
        assert!(estimates.windows(2).all(|w| w[0].win_rate >= w[1].win_rate));
        assert_eq!(estimates[0].opponent, "Amber/Amethyst");
    }

    #[test]
    fn test_invalid_tables_rejected() {
        assert!(MatchupTable::from_toml_str(
            "[[matchup]]\narchetype = \"A\"\nopponent = \"B\"\nwin_rate = 1.5\n"
        )
        .is_err());
        assert!(MatchupTable::from_toml_str(
            "[[card_adjustment]]\ncard = \"X\"\nopponent = \"B\"\ndelta = 0.9\n"
        )
        .is_err());
        assert!(MatchupTable::from_file(Path::new("/definitely/missing.toml")).is_err());
    }
}
