//! Adds/cuts suggestions from a pool of similar tournament decks.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    placement_weight, round_to, CardEntry, DeckCounts, Priority, SimilarDeck, Suggestion,
    SuggestionReport,
};

/// Copies allowed per card.
pub const MAX_COPIES: u32 = 4;

/// Thresholds for the suggestion engine. Presence values are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestOptions {
    /// Minimum share of pool decks running a card before suggesting it
    pub add_min_presence: f64,
    /// Pool average must exceed the user's copies by this much
    pub add_margin: f64,
    /// Cards below this presence are cut candidates
    pub cut_max_presence: f64,
    /// User copies must exceed the pool average by this much
    pub cut_margin: f64,
    pub max_suggestions: usize,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            add_min_presence: 0.45,
            add_margin: 0.75,
            cut_max_presence: 0.30,
            cut_margin: 1.0,
            max_suggestions: 12,
        }
    }
}

#[derive(Debug, Default)]
struct CardUsage {
    display_name: Option<String>,
    decks_running: usize,
    weighted_copies: f64,
    weight_running: f64,
}

/// Derive adds and cuts for `user_cards` from a scored pool.
///
/// Each pool deck is weighted by `similarity × placement weight`; when every
/// weight is zero all decks count equally.
pub fn suggest_adds_cuts(
    user_cards: &[CardEntry],
    pool: &[SimilarDeck],
    options: &SuggestOptions,
) -> SuggestionReport {
    if pool.is_empty() {
        return SuggestionReport::default();
    }

    let user = DeckCounts::from_entries(user_cards);
    let user_names = display_names(user_cards);

    let mut weights: Vec<f64> = pool
        .iter()
        .map(|d| d.score.max(0.0) * placement_weight(d.placement))
        .collect();
    if weights.iter().all(|&w| w <= 0.0) {
        weights = vec![1.0; pool.len()];
    }
    let total_weight: f64 = weights.iter().sum();

    let mut usage: BTreeMap<String, CardUsage> = BTreeMap::new();
    for (similar, &weight) in pool.iter().zip(&weights) {
        let counts = similar.deck.counts();
        let names = display_names(&similar.deck.cards);
        for (key, qty) in counts.iter() {
            let entry = usage.entry(key.to_string()).or_default();
            entry.decks_running += 1;
            entry.weighted_copies += weight * qty as f64;
            entry.weight_running += weight;
            if entry.display_name.is_none() {
                entry.display_name = names.get(key).cloned();
            }
        }
    }

    let pool_size = pool.len() as f64;
    let mut adds = Vec::new();
    for (key, card) in &usage {
        let presence = card.decks_running as f64 / pool_size;
        if presence < options.add_min_presence {
            continue;
        }
        let avg_copies = average(card.weighted_copies, card.weight_running);
        let current = user.get(key);
        let gap = avg_copies - current as f64;
        if gap < options.add_margin {
            continue;
        }
        let suggested = (avg_copies.round() as u32).min(MAX_COPIES);
        if suggested <= current {
            continue;
        }

        let priority = if presence >= 0.75 {
            Priority::High
        } else if presence >= 0.55 {
            Priority::Medium
        } else {
            Priority::Low
        };

        adds.push(Suggestion {
            name: card.display_name.clone().unwrap_or_else(|| key.clone()),
            key: key.clone(),
            presence: round_to(presence * 100.0, 1),
            avg_copies: round_to(avg_copies, 2),
            current_qty: current,
            suggested_qty: suggested,
            priority,
            reason: format!(
                "Played in {:.0}% of similar decks at {:.1} copies on average",
                presence * 100.0,
                avg_copies
            ),
        });
    }

    let mut cuts = Vec::new();
    for (key, current) in user.iter() {
        let card = usage.get(key);
        let presence = card.map_or(0.0, |c| c.decks_running as f64 / pool_size);
        let pool_avg = card.map_or(0.0, |c| average(c.weighted_copies, total_weight));
        let avg_copies = card.map_or(0.0, |c| average(c.weighted_copies, c.weight_running));

        let absent = card.is_none();
        let rare_and_heavy =
            presence < options.cut_max_presence && current as f64 - pool_avg >= options.cut_margin;
        if !absent && !rare_and_heavy {
            continue;
        }

        let priority = if absent {
            Priority::High
        } else if presence < 0.15 {
            Priority::Medium
        } else {
            Priority::Low
        };
        let suggested = if absent {
            0
        } else {
            (pool_avg.round() as u32).min(current.saturating_sub(1))
        };
        let reason = if absent {
            "Not played in any similar deck".to_string()
        } else {
            format!(
                "Only {:.0}% of similar decks run it; they average {:.1} copies",
                presence * 100.0,
                pool_avg
            )
        };

        cuts.push(Suggestion {
            name: user_names.get(key).cloned().unwrap_or_else(|| key.to_string()),
            key: key.to_string(),
            presence: round_to(presence * 100.0, 1),
            avg_copies: round_to(avg_copies, 2),
            current_qty: current,
            suggested_qty: suggested,
            priority,
            reason,
        });
    }

    adds.sort_by(|a, b| {
        b.presence
            .partial_cmp(&a.presence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.avg_copies.partial_cmp(&a.avg_copies).unwrap_or(Ordering::Equal))
            .then_with(|| a.key.cmp(&b.key))
    });
    cuts.sort_by(|a, b| {
        a.presence
            .partial_cmp(&b.presence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.current_qty.cmp(&a.current_qty))
            .then_with(|| a.key.cmp(&b.key))
    });
    adds.truncate(options.max_suggestions);
    cuts.truncate(options.max_suggestions);

    SuggestionReport {
        adds,
        cuts,
        pool_size: pool.len(),
    }
}

fn average(total: f64, weight: f64) -> f64 {
    if weight > 0.0 {
        total / weight
    } else {
        0.0
    }
}

/// First display name seen for each normalized key.
fn display_names(cards: &[CardEntry]) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    for card in cards {
        let key = card.normalized_name();
        if !key.is_empty() {
            names.entry(key).or_insert_with(|| card.name.trim().to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TournamentDeck;

    fn similar(score: f64, standing: &str, cards: &[(&str, i64)]) -> SimilarDeck {
        let deck = TournamentDeck {
            standing: Some(standing.to_string()),
            cards: cards.iter().map(|(n, q)| CardEntry::new(*n, *q)).collect(),
            ..Default::default()
        };
        SimilarDeck {
            placement: deck.placement(),
            fingerprint: deck.fingerprint(),
            deck,
            score,
            archetype: "Amber/Steel".to_string(),
        }
    }

    fn cards(list: &[(&str, i64)]) -> Vec<CardEntry> {
        list.iter().map(|(n, q)| CardEntry::new(*n, *q)).collect()
    }

    #[test]
    fn test_empty_pool() {
        let report = suggest_adds_cuts(&cards(&[("Goofy", 4)]), &[], &SuggestOptions::default());
        assert!(report.adds.is_empty());
        assert!(report.cuts.is_empty());
        assert_eq!(report.pool_size, 0);
    }

    #[test]
    fn test_staple_missing_from_user_deck_is_added() {
        let pool = vec![
            similar(0.8, "1st", &[("Be Our Guest", 4), ("Goofy", 4)]),
            similar(0.6, "Top 8", &[("Be Our Guest", 4), ("Goofy", 2)]),
            similar(0.5, "Top 32", &[("Be Our Guest", 4), ("Pluto", 4)]),
        ];
        let report = suggest_adds_cuts(&cards(&[("Goofy", 4)]), &pool, &SuggestOptions::default());

        let add = report.adds.iter().find(|s| s.key == "be our guest").unwrap();
        assert_eq!(add.name, "Be Our Guest");
        assert_eq!(add.current_qty, 0);
        assert_eq!(add.suggested_qty, 4);
        assert!(add.suggested_qty <= MAX_COPIES);
        assert_eq!(add.presence, 100.0);
        assert_eq!(add.priority, Priority::High);
        assert!(report.adds.iter().all(|s| s.key != "goofy"));
    }

    #[test]
    fn test_unplayed_user_card_is_cut() {
        let pool = vec![
            similar(0.7, "1st", &[("Goofy", 4)]),
            similar(0.7, "2nd", &[("Goofy", 4)]),
        ];
        let report = suggest_adds_cuts(
            &cards(&[("Goofy", 4), ("Donald Duck", 4)]),
            &pool,
            &SuggestOptions::default(),
        );

        assert_eq!(report.cuts.len(), 1);
        let cut = &report.cuts[0];
        assert_eq!(cut.name, "Donald Duck");
        assert_eq!(cut.presence, 0.0);
        assert_eq!(cut.suggested_qty, 0);
        assert_eq!(cut.priority, Priority::High);
    }

    #[test]
    fn test_rare_heavy_card_is_trimmed() {
        let mut pool: Vec<SimilarDeck> = (0..9)
            .map(|_| similar(0.6, "Top 8", &[("Goofy", 4)]))
            .collect();
        pool.push(similar(0.6, "Top 8", &[("Goofy", 4), ("Pluto", 1)]));

        let report = suggest_adds_cuts(
            &cards(&[("Goofy", 4), ("Pluto", 4)]),
            &pool,
            &SuggestOptions::default(),
        );
        let cut = report.cuts.iter().find(|s| s.key == "pluto").unwrap();
        assert_eq!(cut.presence, 10.0);
        assert_eq!(cut.priority, Priority::Medium);
        assert_eq!(cut.suggested_qty, 0);
    }

    #[test]
    fn test_add_priorities_follow_presence() {
        // 3 of 5 decks = 60% → Medium; 5 of 5 → High.
        let pool = vec![
            similar(0.5, "1st", &[("Goofy", 4), ("Pluto", 4)]),
            similar(0.5, "2nd", &[("Goofy", 4), ("Pluto", 4)]),
            similar(0.5, "3rd", &[("Goofy", 4), ("Pluto", 4)]),
            similar(0.5, "4th", &[("Goofy", 4)]),
            similar(0.5, "5th", &[("Goofy", 4)]),
        ];
        let report = suggest_adds_cuts(&cards(&[("Daisy Duck", 4)]), &pool, &SuggestOptions::default());

        assert_eq!(report.adds.len(), 2);
        assert_eq!(report.adds[0].key, "goofy");
        assert_eq!(report.adds[0].priority, Priority::High);
        assert_eq!(report.adds[1].key, "pluto");
        assert_eq!(report.adds[1].priority, Priority::Medium);
    }

    #[test]
    fn test_small_gap_not_suggested() {
        let pool = vec![
            similar(0.9, "1st", &[("Goofy", 4)]),
            similar(0.9, "2nd", &[("Goofy", 3)]),
        ];
        let report = suggest_adds_cuts(&cards(&[("Goofy", 3)]), &pool, &SuggestOptions::default());
        assert!(report.adds.is_empty());
    }

    #[test]
    fn test_zero_scores_use_uniform_weights() {
        let pool = vec![
            similar(0.0, "1st", &[("Goofy", 4)]),
            similar(0.0, "2nd", &[("Goofy", 2)]),
        ];
        let report = suggest_adds_cuts(&cards(&[("Pluto", 1)]), &pool, &SuggestOptions::default());
        let add = report.adds.iter().find(|s| s.key == "goofy").unwrap();
        assert_eq!(add.avg_copies, 3.0);
        assert_eq!(add.suggested_qty, 3);
    }

    #[test]
    fn test_lists_capped() {
        let many: Vec<(String, i64)> = (0..20).map(|i| (format!("Card {}", i), 4)).collect();
        let many_refs: Vec<(&str, i64)> = many.iter().map(|(n, q)| (n.as_str(), *q)).collect();
        let pool = vec![similar(1.0, "1st", &many_refs)];

        let options = SuggestOptions {
            max_suggestions: 5,
            ..Default::default()
        };
        let report = suggest_adds_cuts(&cards(&[("Unrelated", 4)]), &pool, &options);
        assert_eq!(report.adds.len(), 5);
        assert_eq!(report.cuts.len(), 1);
    }
}
