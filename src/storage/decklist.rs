//! User decklist files for the CLI.
//!
//! Accepted shapes:
//! - JSON array of cards, or `{"cards": [...]}`
//! - Plain text, one `4 Card Name` or `4x Card Name` per line; blank lines
//!   and lines starting with `#` or `//` are ignored

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::StorageError;
use crate::models::CardEntry;

static TEXT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*[xX]?\s+(\S.*?)\s*$").unwrap());

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeckFile {
    Cards(Vec<CardEntry>),
    Wrapped { cards: Vec<CardEntry> },
}

/// Parse decklist text in any accepted shape.
pub fn parse_decklist(contents: &str) -> Result<Vec<CardEntry>, StorageError> {
    let trimmed = contents.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let file: DeckFile = serde_json::from_str(trimmed)?;
        return Ok(match file {
            DeckFile::Cards(cards) | DeckFile::Wrapped { cards } => cards,
        });
    }

    let mut cards = Vec::new();
    for (index, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let captures = TEXT_LINE.captures(line).ok_or_else(|| {
            StorageError::InvalidDecklist(format!(
                "line {}: expected \"<qty> <name>\", got {:?}",
                index + 1,
                line
            ))
        })?;
        let quantity: i64 = captures[1].parse().map_err(|_| {
            StorageError::InvalidDecklist(format!("line {}: quantity out of range", index + 1))
        })?;
        cards.push(CardEntry::new(&captures[2], quantity));
    }
    Ok(cards)
}

/// Read and parse a decklist file.
pub fn read_decklist_file(path: &Path) -> Result<Vec<CardEntry>, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    parse_decklist(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(cards: &[CardEntry]) -> Vec<(String, i64)> {
        cards.iter().map(|c| (c.name.clone(), c.quantity)).collect()
    }

    #[test]
    fn test_text_decklist() {
        let cards = parse_decklist(
            "# Amber/Steel\n4 Goofy - Musketeer\n4x Donald Duck - Strutting His Stuff\n\n2X  Pluto  \n// sideboard\n",
        )
        .unwrap();
        assert_eq!(
            pairs(&cards),
            vec![
                ("Goofy - Musketeer".to_string(), 4),
                ("Donald Duck - Strutting His Stuff".to_string(), 4),
                ("Pluto".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_json_decklists() {
        let bare = parse_decklist(r#"[{"name": "Goofy", "quantity": 4}]"#).unwrap();
        let wrapped = parse_decklist(r#"{"cards": [{"name": "Goofy", "qty": 4}]}"#).unwrap();
        assert_eq!(pairs(&bare), pairs(&wrapped));
    }

    #[test]
    fn test_bad_lines_rejected() {
        let err = parse_decklist("4 Goofy\nGoofy four times\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(matches!(parse_decklist("[{oops"), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_read_decklist_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.txt");
        fs::write(&path, "4 Stitch - Rock Star\n").unwrap();
        assert_eq!(read_decklist_file(&path).unwrap().len(), 1);
        assert!(matches!(
            read_decklist_file(&temp_dir.path().join("missing.txt")),
            Err(StorageError::PathNotFound(_))
        ));
    }
}
