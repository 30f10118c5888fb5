//! Tournament deck records and the in-memory corpus.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use serde_json::Value;
use tracing::warn;

use super::card::{lenient_cards, string_or_number};
use super::{parse_placement, CardEntry, DeckCounts, DeckFingerprint};

/// A scraped tournament decklist plus provenance metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDeck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Event date, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Free-form placement ("Top 8", "2nd", "Winner", ...)
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub standing: Option<String>,

    /// Alternative placement field used by some snapshots
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rank_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,

    /// Deck title as listed by the source site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inks: Vec<String>,

    #[serde(default, deserialize_with = "lenient_cards")]
    pub cards: Vec<CardEntry>,
}

impl TournamentDeck {
    /// Placement label, preferring `standing` over `rankLabel`.
    pub fn standing_label(&self) -> Option<&str> {
        self.standing
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.rank_label.as_deref().filter(|s| !s.trim().is_empty()))
    }

    /// Parsed numeric placement.
    pub fn placement(&self) -> Option<u32> {
        self.standing_label().and_then(parse_placement)
    }

    pub fn counts(&self) -> DeckCounts {
        DeckCounts::from_entries(&self.cards)
    }

    pub fn fingerprint(&self) -> DeckFingerprint {
        DeckFingerprint::from_counts(&self.counts())
    }

    /// Event date, if it parses.
    pub fn event_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_event_date)
    }
}

/// Date formats seen in scraped snapshots, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Parse a free-form event date. Returns `None` for anything unrecognized.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // "2025-03-01T10:00:00" without an offset
    let date_part = s.split('T').next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Canonical format name. "Infinity" is an alias of "Core".
pub fn normalize_format(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "infinity" | "core" | "infinity constructed" | "core constructed" => {
            Some("Core".to_string())
        }
        _ => Some(title_case(trimmed)),
    }
}

/// Uppercase the first letter of every whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// On-disk corpus shapes: a bare array or a wrapped document.
///
/// Records stay raw JSON until [`Corpus::from_document`] so one bad record
/// cannot fail the whole file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CorpusDocument {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        format: Option<String>,
        #[serde(default, rename = "updatedAt")]
        updated_at: Option<String>,
        #[serde(default)]
        decks: Vec<Value>,
    },
}

/// The canonical in-memory corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corpus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub decks: Vec<TournamentDeck>,
}

impl Corpus {
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    /// Normalize a parsed document: canonical formats, inherited file-level
    /// format, unreadable and cardless records dropped, duplicates (by
    /// fingerprint) removed.
    pub fn from_document(doc: CorpusDocument) -> Self {
        let (format, updated_at, records) = match doc {
            CorpusDocument::Bare(decks) => (None, None, decks),
            CorpusDocument::Wrapped {
                format,
                updated_at,
                decks,
            } => (format.as_deref().and_then(normalize_format), updated_at, decks),
        };

        let mut decks = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<TournamentDeck>(record) {
                Ok(deck) => decks.push(deck),
                Err(e) => warn!("Skipping corpus record {}: {}", index, e),
            }
        }

        let mut corpus = Corpus {
            format,
            updated_at,
            decks: Vec::with_capacity(decks.len()),
        };
        corpus.extend(decks);
        corpus
    }

    /// Append records whose fingerprint is not already present.
    /// Returns how many were added.
    pub fn extend(&mut self, decks: Vec<TournamentDeck>) -> usize {
        let mut seen: std::collections::HashSet<DeckFingerprint> =
            self.decks.iter().map(TournamentDeck::fingerprint).collect();
        let mut added = 0;

        for mut deck in decks {
            let counts = deck.counts();
            if counts.is_empty() {
                continue;
            }
            deck.format = deck
                .format
                .as_deref()
                .and_then(normalize_format)
                .or_else(|| self.format.clone());
            if seen.insert(DeckFingerprint::from_counts(&counts)) {
                self.decks.push(deck);
                added += 1;
            }
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(cards: &[(&str, i64)]) -> TournamentDeck {
        TournamentDeck {
            cards: cards.iter().map(|(n, q)| CardEntry::new(*n, *q)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_standing_accepts_number() {
        let d: TournamentDeck =
            serde_json::from_str(r#"{"standing": 3, "cards": [{"name": "Goofy", "quantity": 4}]}"#)
                .unwrap();
        assert_eq!(d.standing.as_deref(), Some("3"));
        assert_eq!(d.placement(), Some(3));
    }

    #[test]
    fn test_rank_label_fallback() {
        let d: TournamentDeck =
            serde_json::from_str(r#"{"standing": "", "rankLabel": "Top 16", "cards": []}"#).unwrap();
        assert_eq!(d.standing_label(), Some("Top 16"));
        assert_eq!(d.placement(), Some(16));
    }

    #[test]
    fn test_parse_event_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_event_date("2025-03-01"), Some(expected));
        assert_eq!(parse_event_date("2025-03-01T18:30:00Z"), Some(expected));
        assert_eq!(parse_event_date("2025-03-01T18:30:00"), Some(expected));
        assert_eq!(parse_event_date("2025/03/01"), Some(expected));
        assert_eq!(parse_event_date("03/01/2025"), Some(expected));
        assert_eq!(parse_event_date("March 1, 2025"), Some(expected));
        assert_eq!(parse_event_date("Mar 1, 2025"), Some(expected));
        assert_eq!(parse_event_date("1 March 2025"), Some(expected));
        assert_eq!(parse_event_date("last weekend"), None);
        assert_eq!(parse_event_date(""), None);
    }

    #[test]
    fn test_normalize_format() {
        assert_eq!(normalize_format("Infinity").as_deref(), Some("Core"));
        assert_eq!(normalize_format("  infinity ").as_deref(), Some("Core"));
        assert_eq!(normalize_format("core").as_deref(), Some("Core"));
        assert_eq!(normalize_format("ALPHA draft").as_deref(), Some("Alpha Draft"));
        assert_eq!(normalize_format("   "), None);
    }

    #[test]
    fn test_document_shapes_normalize_to_corpus() {
        let bare: CorpusDocument =
            serde_json::from_str(r#"[{"format": "Infinity", "cards": [{"name": "Goofy", "quantity": 4}]}]"#)
                .unwrap();
        let wrapped: CorpusDocument = serde_json::from_str(
            r#"{"format": "Infinity", "updatedAt": "2025-01-01", "decks": [{"cards": [{"name": "Goofy", "quantity": 4}]}]}"#,
        )
        .unwrap();

        let bare = Corpus::from_document(bare);
        let wrapped = Corpus::from_document(wrapped);

        assert_eq!(bare.decks[0].format.as_deref(), Some("Core"));
        assert_eq!(wrapped.decks[0].format.as_deref(), Some("Core"));
        assert_eq!(wrapped.updated_at.as_deref(), Some("2025-01-01"));
    }

    #[test]
    fn test_bad_records_skipped_not_fatal() {
        let doc: CorpusDocument = serde_json::from_str(
            r#"{"decks": [
                {"standing": "1st", "cards": [{"name": "Goofy", "quantity": 4}]},
                {"standing": "2nd", "cards": [{"name": null, "quantity": 4}, {"name": "Pluto", "quantity": "2"}]},
                {"standing": "3rd", "cards": null},
                {"standing": "4th", "cards": ["4 Stitch", {"name": "Stitch", "quantity": 4}]},
                {"event": ["not", "a", "string"], "cards": [{"name": "Minnie", "quantity": 4}]},
                "garbage"
            ]}"#,
        )
        .unwrap();

        let corpus = Corpus::from_document(doc);
        let names: Vec<String> = corpus
            .decks
            .iter()
            .map(|d| d.cards.iter().map(|c| c.name.clone()).collect::<Vec<_>>().join(","))
            .collect();
        assert_eq!(names, vec!["Goofy", ",Pluto", "Stitch"]);
        assert_eq!(corpus.decks[1].counts().get("pluto"), 2);
    }

    #[test]
    fn test_corpus_dedupes_by_fingerprint() {
        let mut corpus = Corpus::default();
        let added = corpus.extend(vec![
            deck(&[("Goofy", 4), ("Pluto", 2)]),
            deck(&[("pluto", 2), ("GOOFY", 4)]),
            deck(&[("Goofy", 3)]),
            deck(&[]),
        ]);
        assert_eq!(added, 2);
        assert_eq!(corpus.len(), 2);
    }
}
