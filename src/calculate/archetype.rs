//! Archetype inference.
//!
//! A deck's archetype comes from the first usable source, in order:
//! explicit `archetype`, `title`, declared `inks`, inks inferred from the
//! cards, and finally `"Unknown"`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{normalize_card_name, RulesError};
use crate::models::{title_case, TournamentDeck};

/// Fallback label when nothing identifies the deck.
pub const UNKNOWN_ARCHETYPE: &str = "Unknown";

const BUILTIN_RULES: &str = include_str!("../../data/archetype_keywords.toml");

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    inks: BTreeMap<String, Vec<String>>,
}

/// Ink → card-name keyword table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeRules {
    /// Canonical ink name → normalized keywords
    inks: BTreeMap<String, Vec<String>>,
}

impl Default for ArchetypeRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ArchetypeRules {
    /// The keyword table shipped with the crate.
    pub fn builtin() -> Self {
        // The embedded table is covered by tests; an empty table is the only
        // possible fallback.
        Self::from_toml_str(BUILTIN_RULES).unwrap_or_else(|_| Self {
            inks: BTreeMap::new(),
        })
    }

    /// Parse a keyword table from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, RulesError> {
        let file: RulesFile = toml::from_str(contents)?;
        let mut inks = BTreeMap::new();
        for (ink, keywords) in file.inks {
            let ink = title_case(ink.trim());
            if ink.is_empty() {
                return Err(RulesError::Invalid("empty ink name".to_string()));
            }
            let keywords: Vec<String> = keywords
                .iter()
                .map(|k| normalize_card_name(k))
                .filter(|k| !k.is_empty())
                .collect();
            inks.insert(ink, keywords);
        }
        Ok(Self { inks })
    }

    /// Load a keyword table from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        let rules = Self::from_toml_str(&contents)?;
        debug!(
            "Loaded keywords for {} from {:?}",
            rules.ink_names().collect::<Vec<_>>().join(", "),
            path
        );
        Ok(rules)
    }

    pub fn ink_names(&self) -> impl Iterator<Item = &str> {
        self.inks.keys().map(String::as_str)
    }

    /// Infer the archetype label of a deck.
    pub fn infer(&self, deck: &TournamentDeck) -> String {
        if let Some(archetype) = deck.archetype.as_deref().map(str::trim) {
            if !archetype.is_empty() && !archetype.eq_ignore_ascii_case(UNKNOWN_ARCHETYPE) {
                return archetype.to_string();
            }
        }

        if let Some(title) = deck.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                return title.to_string();
            }
        }

        let declared: Vec<String> = deck
            .inks
            .iter()
            .map(|ink| title_case(ink.trim()))
            .filter(|ink| !ink.is_empty())
            .take(2)
            .collect();
        if !declared.is_empty() {
            return join_inks(declared);
        }

        let inferred = self.infer_inks(deck);
        if !inferred.is_empty() {
            return join_inks(inferred);
        }

        UNKNOWN_ARCHETYPE.to_string()
    }

    /// The (at most two) strongest inks suggested by the cards themselves.
    ///
    /// Card-level `ink` fields and keyword hits both count, weighted by
    /// quantity. Ties break alphabetically.
    pub fn infer_inks(&self, deck: &TournamentDeck) -> Vec<String> {
        let mut scores: BTreeMap<String, i64> = BTreeMap::new();

        for card in &deck.cards {
            if card.quantity <= 0 {
                continue;
            }

            if let Some(ink) = card.ink.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
                *scores.entry(title_case(ink)).or_default() += card.quantity;
                continue;
            }

            let padded = format!(" {} ", normalize_card_name(&card.name));
            if padded.trim().is_empty() {
                continue;
            }
            for (ink, keywords) in &self.inks {
                if keywords
                    .iter()
                    .any(|k| padded.contains(&format!(" {} ", k)))
                {
                    *scores.entry(ink.clone()).or_default() += card.quantity;
                }
            }
        }

        let mut ranked: Vec<(String, i64)> = scores.into_iter().filter(|(_, s)| *s > 0).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.into_iter().take(2).map(|(ink, _)| ink).collect()
    }
}

/// Canonical "Ink/Ink" label: sorted so "Steel/Amber" and "Amber/Steel" agree.
fn join_inks(mut inks: Vec<String>) -> String {
    inks.sort();
    inks.dedup();
    inks.join("/")
}
