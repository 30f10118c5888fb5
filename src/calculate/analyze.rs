//! Meta analysis: archetype shares, card popularity and diversity.
//!
//! The corpus is split into week (last 7 days), month (last 30 days) and
//! all-time windows relative to a reference date. Without any parsable
//! date the whole corpus is treated as a single snapshot and every trend is
//! stable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use super::ArchetypeRules;
use crate::models::{
    normalize_format, round_to, ArchetypeTrend, CardTrend, DeckCounts, HealthLabel, MetaHealth,
    MetaReport, TournamentDeck, Trend, WindowCounts,
};

/// Points of share change before an archetype counts as moving.
pub const ARCHETYPE_TREND_THRESHOLD: f64 = 5.0;
/// Points of presence change before a card counts as moving.
pub const CARD_TREND_THRESHOLD: f64 = 10.0;
/// Minimum share (%) for an archetype to count as viable.
pub const VIABLE_SHARE: f64 = 5.0;

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Options for a meta report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    /// Only analyze decks of this format
    pub format: Option<String>,
    /// Windows end on this date instead of the newest deck's date
    pub reference_date: Option<NaiveDate>,
    /// Number of cards in the popularity table
    pub card_limit: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            format: None,
            reference_date: None,
            card_limit: 20,
        }
    }
}

struct DeckView<'a> {
    deck: &'a TournamentDeck,
    archetype: String,
    counts: DeckCounts,
    placement: Option<u32>,
    in_week: bool,
    in_month: bool,
}

/// Builds [`MetaReport`]s from a slice of corpus decks.
pub struct MetaAnalyzer<'a> {
    rules: &'a ArchetypeRules,
}

impl<'a> MetaAnalyzer<'a> {
    pub fn new(rules: &'a ArchetypeRules) -> Self {
        Self { rules }
    }

    pub fn analyze(&self, decks: &[TournamentDeck], options: &AnalyzeOptions) -> MetaReport {
        let wanted_format = options.format.as_deref().and_then(normalize_format);
        let selected: Vec<&TournamentDeck> = decks
            .iter()
            .filter(|d| match &wanted_format {
                Some(f) => d
                    .format
                    .as_deref()
                    .is_some_and(|df| df.eq_ignore_ascii_case(f)),
                None => true,
            })
            .collect();

        let dated: Vec<Option<NaiveDate>> = selected.iter().map(|d| d.event_date()).collect();
        let newest = dated.iter().flatten().max().copied();
        let snapshot = newest.is_none();
        let reference = options.reference_date.or(newest);

        let views: Vec<DeckView> = selected
            .iter()
            .copied()
            .zip(&dated)
            .map(|(deck, date)| {
                let (in_week, in_month) = if snapshot {
                    (true, true)
                } else {
                    match (date, reference) {
                        (Some(d), Some(r)) => (within(*d, r, WEEK_DAYS), within(*d, r, MONTH_DAYS)),
                        _ => (false, false),
                    }
                };
                DeckView {
                    deck,
                    archetype: self.rules.infer(deck),
                    counts: deck.counts(),
                    placement: deck.placement(),
                    in_week,
                    in_month,
                }
            })
            .collect();

        let windows = WindowCounts {
            week: views.iter().filter(|v| v.in_week).count(),
            month: views.iter().filter(|v| v.in_month).count(),
            all: views.len(),
        };

        debug!(
            "Analyzing {} decks (week {}, month {}, snapshot {})",
            windows.all, windows.week, windows.month, snapshot
        );

        let archetypes = archetype_trends(&views, &windows, snapshot);
        let cards = card_trends(&views, &windows, snapshot, options.card_limit);
        let health = meta_health(&archetypes);

        MetaReport {
            total_decks: windows.all,
            windows,
            snapshot,
            reference_date: if snapshot { None } else { reference },
            format: wanted_format,
            archetypes,
            cards,
            health,
        }
    }
}

/// `date` falls within the `days` days ending on `reference` (inclusive).
fn within(date: NaiveDate, reference: NaiveDate, days: i64) -> bool {
    date <= reference && date > reference - Duration::days(days)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn archetype_trends(views: &[DeckView], windows: &WindowCounts, snapshot: bool) -> Vec<ArchetypeTrend> {
    #[derive(Default)]
    struct Tally {
        week: usize,
        month: usize,
        all: usize,
        placements: Vec<u32>,
    }

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    for view in views {
        let tally = tallies.entry(view.archetype.as_str()).or_default();
        tally.all += 1;
        if view.in_week {
            tally.week += 1;
        }
        if view.in_month {
            tally.month += 1;
            if let Some(p) = view.placement {
                tally.placements.push(p);
            }
        }
    }

    let mut trends: Vec<ArchetypeTrend> = tallies
        .into_iter()
        .map(|(archetype, tally)| {
            let week_share = round_to(percent(tally.week, windows.week), 1);
            let month_share = round_to(percent(tally.month, windows.month), 1);
            let (change, trend) = if snapshot {
                (0.0, Trend::Stable)
            } else {
                let change = round_to(week_share - month_share, 1);
                (change, Trend::from_change(change, ARCHETYPE_TREND_THRESHOLD))
            };
            let avg_placement = if tally.placements.is_empty() {
                None
            } else {
                let sum: u32 = tally.placements.iter().sum();
                Some(round_to(sum as f64 / tally.placements.len() as f64, 2))
            };
            ArchetypeTrend {
                archetype: archetype.to_string(),
                week_share,
                month_share,
                change,
                trend,
                avg_placement,
                deck_count: tally.all,
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.month_share
            .partial_cmp(&a.month_share)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.deck_count.cmp(&a.deck_count))
            .then_with(|| a.archetype.cmp(&b.archetype))
    });
    trends
}

fn card_trends(
    views: &[DeckView],
    windows: &WindowCounts,
    snapshot: bool,
    limit: usize,
) -> Vec<CardTrend> {
    #[derive(Default)]
    struct Tally {
        name: Option<String>,
        week: usize,
        month: usize,
        copies: u64,
        running: usize,
    }

    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for view in views {
        for (key, qty) in view.counts.iter() {
            let tally = tallies.entry(key.to_string()).or_default();
            tally.running += 1;
            tally.copies += qty as u64;
            if view.in_week {
                tally.week += 1;
            }
            if view.in_month {
                tally.month += 1;
            }
            if tally.name.is_none() {
                tally.name = view
                    .deck
                    .cards
                    .iter()
                    .find(|c| c.normalized_name() == key)
                    .map(|c| c.name.trim().to_string());
            }
        }
    }

    let mut trends: Vec<CardTrend> = tallies
        .into_iter()
        .filter(|(_, t)| t.month > 0)
        .map(|(key, tally)| {
            let week_presence = round_to(percent(tally.week, windows.week), 1);
            let month_presence = round_to(percent(tally.month, windows.month), 1);
            let (change, trend) = if snapshot {
                (0.0, Trend::Stable)
            } else {
                let change = round_to(week_presence - month_presence, 1);
                (change, Trend::from_change(change, CARD_TREND_THRESHOLD))
            };
            CardTrend {
                name: tally.name.unwrap_or_else(|| key.clone()),
                key,
                week_presence,
                month_presence,
                change,
                trend,
                avg_copies: round_to(tally.copies as f64 / tally.running.max(1) as f64, 2),
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.month_presence
            .partial_cmp(&a.month_presence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    trends.truncate(limit);
    trends
}

/// Diversity summary from month-window archetype shares.
pub fn meta_health(archetypes: &[ArchetypeTrend]) -> MetaHealth {
    let shares: Vec<f64> = archetypes
        .iter()
        .map(|a| a.month_share)
        .filter(|&s| s > 0.0)
        .collect();
    health_from_shares(&shares)
}

/// Normalized Shannon entropy of a share distribution (percentages or
/// fractions; they are renormalized).
pub fn health_from_shares(shares: &[f64]) -> MetaHealth {
    let total: f64 = shares.iter().filter(|&&s| s > 0.0).sum();
    let probabilities: Vec<f64> = if total > 0.0 {
        shares.iter().filter(|&&s| s > 0.0).map(|s| s / total).collect()
    } else {
        Vec::new()
    };

    let diversity = if probabilities.len() > 1 {
        let entropy: f64 = probabilities.iter().map(|p| -p * p.ln()).sum();
        let max_entropy = (probabilities.len() as f64).ln();
        round_to((entropy / max_entropy * 100.0).clamp(0.0, 100.0), 1)
    } else {
        0.0
    };

    let concentration = round_to(
        probabilities.iter().copied().fold(0.0, f64::max) * 100.0,
        1,
    );
    let viable_archetypes = probabilities
        .iter()
        .filter(|&&p| p * 100.0 >= VIABLE_SHARE)
        .count();

    MetaHealth {
        diversity,
        concentration,
        viable_archetypes,
        health: HealthLabel::classify(concentration, viable_archetypes, diversity),
    }
}
