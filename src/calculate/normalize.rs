//! Card-name normalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a card name into the join key used across decks.
///
/// Lowercases, strips diacritics, turns every non-alphanumeric character
/// into a space and collapses runs of whitespace. Idempotent and total.
pub fn normalize_card_name(raw: &str) -> String {
    // Lowercasing can reintroduce combining marks (e.g. 'İ'), so fold twice.
    let folded: String = raw
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(
            normalize_card_name("Mickey Mouse - Brave Little Tailor"),
            "mickey mouse brave little tailor"
        );
        assert_eq!(normalize_card_name("  Be   Our Guest  "), "be our guest");
    }

    #[test]
    fn test_normalize_strips_diacritics_and_punctuation() {
        assert_eq!(normalize_card_name("Pokémon"), "pokemon");
        assert_eq!(normalize_card_name("Maui—Demigod!"), "maui demigod");
        assert_eq!(normalize_card_name("Let's Get Dangerous"), "let s get dangerous");
        assert_eq!(normalize_card_name("Hiram Flaversham, Toymaker"), "hiram flaversham toymaker");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_card_name(""), "");
        assert_eq!(normalize_card_name(" -- ,, "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "",
            "   ",
            "Mickey Mouse - Brave Little Tailor",
            "Ÿzma – Scary Beyond All Reason",
            "İstanbul Café",
            "ℌercules",
            "Ariel\tOn\nHuman Legs",
            "Stitch — Rock Star!!",
            "ﬁnal ﬂourish",
            "Daisy Duck (Enchanted)",
            "12 Chip & Dale",
        ];
        for s in samples {
            let once = normalize_card_name(s);
            assert_eq!(normalize_card_name(&once), once, "not idempotent for {:?}", s);
        }
    }
}
