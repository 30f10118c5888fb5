//! Meta comparison: find the corpus decks closest to a user's list.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::{ArchetypeRules, SimilarityStrategy};
use crate::models::{
    is_top_cut, normalize_format, round_to, AggregateStats, CardEntry, ComparisonReport, Corpus, DeckCounts,
    SimilarDeck, TournamentDeck,
};

pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.35;

/// Filters and limits for a comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareOptions {
    /// Keep only decks that finished at or above this place
    pub top: Option<u32>,
    /// Restrict candidates to `format`
    pub same_format: bool,
    pub format: Option<String>,
    pub top_k: usize,
    #[serde(alias = "minSim")]
    pub min_similarity: f64,
    pub strategy: SimilarityStrategy,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            top: None,
            same_format: false,
            format: None,
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            strategy: SimilarityStrategy::default(),
        }
    }
}

impl CompareOptions {
    /// Format the `same_format` filter keeps: the requested one, else the
    /// corpus file's own format.
    fn wanted_format(&self, corpus: &Corpus) -> Option<String> {
        self.format
            .as_deref()
            .and_then(normalize_format)
            .or_else(|| corpus.format.clone())
    }

    fn accepts(&self, deck: &TournamentDeck, placement: Option<u32>, format: Option<&str>) -> bool {
        if let Some(limit) = self.top {
            match placement {
                Some(p) if p <= limit => {}
                _ => return false,
            }
        }

        if let Some(wanted) = format {
            match deck.format.as_deref() {
                Some(f) if f.eq_ignore_ascii_case(wanted) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Compares decklists against a loaded corpus.
pub struct MetaComparator<'a> {
    corpus: &'a Corpus,
    rules: &'a ArchetypeRules,
    enabled: bool,
    note: Option<String>,
}

impl<'a> MetaComparator<'a> {
    pub fn new(corpus: &'a Corpus, rules: &'a ArchetypeRules) -> Self {
        Self {
            corpus,
            rules,
            enabled: true,
            note: None,
        }
    }

    /// Turn comparison on or off; a disabled comparator returns an empty report.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Carry the loader's note into unavailable reports.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Score the corpus against `user_cards`.
    pub fn compare(&self, user_cards: &[CardEntry], options: &CompareOptions) -> ComparisonReport {
        if !self.enabled {
            return ComparisonReport::disabled("Meta comparison is disabled");
        }
        if self.corpus.is_empty() {
            return ComparisonReport::unavailable(self.note.clone());
        }

        let user = DeckCounts::from_entries(user_cards);
        let top_k = options.top_k.max(1);

        let format = if options.same_format {
            match options.wanted_format(self.corpus) {
                Some(format) => Some(format),
                None => {
                    return ComparisonReport {
                        enabled: true,
                        available: true,
                        similar_decks: Vec::new(),
                        aggregate: AggregateStats::default(),
                        compared_count: 0,
                        note: Some(
                            "sameFormat needs a format: pass one or set it in the tournament meta file"
                                .to_string(),
                        ),
                    };
                }
            }
        } else {
            None
        };

        let candidates: Vec<(&TournamentDeck, Option<u32>)> = self
            .corpus
            .decks
            .iter()
            .map(|d| (d, d.placement()))
            .filter(|(d, p)| options.accepts(d, *p, format.as_deref()))
            .collect();

        let labelled: Vec<(&TournamentDeck, Option<u32>, String)> = candidates
            .into_iter()
            .map(|(d, p)| (d, p, self.rules.infer(d)))
            .collect();

        let aggregate = aggregate_stats(labelled.iter().map(|(_, p, a)| (*p, a.as_str())));
        let compared_count = labelled.len();

        debug!(
            "Comparing {} cards against {} of {} corpus decks",
            user.total(),
            compared_count,
            self.corpus.len()
        );

        if labelled.is_empty() {
            return ComparisonReport {
                enabled: true,
                available: true,
                similar_decks: Vec::new(),
                aggregate,
                compared_count,
                note: Some("No tournament decks match the requested filters".to_string()),
            };
        }

        if user.is_empty() {
            return ComparisonReport {
                enabled: true,
                available: true,
                similar_decks: Vec::new(),
                aggregate,
                compared_count,
                note: Some("Decklist is empty; nothing to compare".to_string()),
            };
        }

        let mut scored: Vec<SimilarDeck> = labelled
            .into_iter()
            .map(|(deck, placement, archetype)| {
                let counts = deck.counts();
                SimilarDeck {
                    score: round_to(options.strategy.score(&user, &counts), 4),
                    fingerprint: crate::models::DeckFingerprint::from_counts(&counts),
                    deck: deck.clone(),
                    placement,
                    archetype,
                }
            })
            .collect();
        scored.sort_by(rank_order);

        let above_floor = scored
            .iter()
            .filter(|s| s.score >= options.min_similarity)
            .count();

        let note = if above_floor == 0 {
            Some(format!(
                "No decks reached the {:.2} similarity floor; showing the closest {} instead",
                options.min_similarity,
                top_k.min(scored.len())
            ))
        } else {
            scored.truncate(above_floor);
            None
        };
        scored.truncate(top_k);

        ComparisonReport {
            enabled: true,
            available: true,
            similar_decks: scored,
            aggregate,
            compared_count,
            note,
        }
    }
}

/// Score desc, then better placement, then url for a stable order.
fn rank_order(a: &SimilarDeck, b: &SimilarDeck) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| match (a.placement, b.placement) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.deck.url.cmp(&b.deck.url))
}

/// Placement aggregates over `(placement, archetype)` pairs.
pub fn aggregate_stats<'a, I>(entries: I) -> AggregateStats
where
    I: IntoIterator<Item = (Option<u32>, &'a str)>,
{
    let mut count = 0usize;
    let mut placements: Vec<u32> = Vec::new();
    let mut by_archetype: BTreeMap<String, usize> = BTreeMap::new();

    for (placement, archetype) in entries {
        count += 1;
        if let Some(p) = placement {
            placements.push(p);
        }
        *by_archetype.entry(archetype.to_string()).or_default() += 1;
    }

    let best_finish = placements.iter().copied().min();
    let (avg_finish, top8_rate) = if placements.is_empty() {
        (None, None)
    } else {
        let n = placements.len() as f64;
        let sum: f64 = placements.iter().map(|&p| p as f64).sum();
        let top8 = placements.iter().filter(|&&p| is_top_cut(Some(p))).count() as f64;
        (Some(round_to(sum / n, 2)), Some(round_to(top8 / n, 3)))
    };

    AggregateStats {
        count,
        best_finish,
        avg_finish,
        top8_rate,
        by_archetype,
    }
}
