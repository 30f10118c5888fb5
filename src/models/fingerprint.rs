//! Content fingerprints for deduplicating corpus records.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::DeckCounts;

/// A deterministic deck ID derived from the deck's card content.
///
/// Two records with the same normalized `qty×name` multiset share a
/// fingerprint regardless of card order, casing or punctuation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeckFingerprint(String);

impl DeckFingerprint {
    /// Hash arbitrary fields, separated by `|`.
    /// Uses SHA256 and keeps the first 16 hex characters.
    pub fn generate(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(field.as_bytes());
        }
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    /// Fingerprint of a deck's normalized card counts.
    pub fn from_counts(counts: &DeckCounts) -> Self {
        // DeckCounts iterates in sorted key order.
        let pairs: Vec<String> = counts
            .iter()
            .map(|(name, qty)| format!("{}x{}", qty, name))
            .collect();
        let fields: Vec<&str> = pairs.iter().map(String::as_str).collect();
        Self::generate(&fields)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DeckFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeckFingerprint({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardEntry;

    #[test]
    fn test_fingerprint_ignores_order_and_formatting() {
        let a = DeckCounts::from_entries(&[
            CardEntry::new("Mickey Mouse - Brave Little Tailor", 4),
            CardEntry::new("Goofy", 2),
        ]);
        let b = DeckCounts::from_entries(&[
            CardEntry::new("goofy", 1),
            CardEntry::new("MICKEY MOUSE, BRAVE LITTLE TAILOR", 4),
            CardEntry::new("Goofy", 1),
        ]);
        assert_eq!(DeckFingerprint::from_counts(&a), DeckFingerprint::from_counts(&b));
    }

    #[test]
    fn test_fingerprint_depends_on_quantity() {
        let a = DeckCounts::from_entries(&[CardEntry::new("Goofy", 4)]);
        let b = DeckCounts::from_entries(&[CardEntry::new("Goofy", 3)]);
        assert_ne!(DeckFingerprint::from_counts(&a), DeckFingerprint::from_counts(&b));
    }

    #[test]
    fn test_fingerprint_length_and_hex() {
        let id = DeckFingerprint::generate(&["4xgoofy"]);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_display_and_debug() {
        let id = DeckFingerprint::generate(&["4xgoofy"]);
        assert_eq!(format!("{}", id), id.as_str());
        assert_eq!(format!("{:?}", id), format!("DeckFingerprint({})", id.as_str()));
    }
}
