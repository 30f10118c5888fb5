//! Card entries and per-deck quantity maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::calculate::normalize_card_name;

/// A single line of a decklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    /// Card name as written by the user or the source site; `null` or a
    /// non-string reads as `""` and the row is dropped when counting
    #[serde(default, deserialize_with = "name_or_empty")]
    pub name: String,

    /// Copies; non-positive or unreadable rows are ignored when counting
    #[serde(
        default = "default_quantity",
        alias = "qty",
        alias = "count",
        alias = "copies",
        deserialize_with = "lenient_quantity"
    )]
    pub quantity: i64,

    #[serde(
        default,
        deserialize_with = "lenient_cost",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost: Option<f64>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ink: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub inkable: Option<bool>,

    #[serde(
        default,
        rename = "type",
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub card_type: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Accept a JSON string or number for free-form label fields.
pub(super) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn name_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_number(deserializer)?.unwrap_or_default())
}

/// Scraped rows carry quantities as integers, floats or strings ("4", "4x").
fn lenient_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(whole)).unwrap_or(0),
        Some(Value::String(s)) => parse_quantity(&s).unwrap_or(0),
        _ => 0,
    })
}

fn lenient_cost<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|c| c.is_finite()),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().to_lowercase().parse::<bool>().ok(),
        _ => None,
    })
}

fn whole(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim().trim_end_matches(['x', 'X']).trim_end();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(whole))
}

/// Read a `cards` array, skipping rows that are not card objects.
pub(super) fn lenient_cards<'de, D>(deserializer: D) -> Result<Vec<CardEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(rows)) => rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl CardEntry {
    /// Create a new entry with just a name and quantity.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            cost: None,
            ink: None,
            inkable: None,
            card_type: None,
        }
    }

    /// Builder method to set the ink.
    pub fn with_ink(mut self, ink: impl Into<String>) -> Self {
        self.ink = Some(ink.into());
        self
    }

    /// Normalized name used as the join key.
    pub fn normalized_name(&self) -> String {
        normalize_card_name(&self.name)
    }
}

/// Normalized card name → total quantity.
///
/// Built once per deck and used as the input to every similarity and
/// frequency computation. Iteration order is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckCounts(BTreeMap<String, u32>);

impl DeckCounts {
    /// Sum quantities by normalized name, dropping empty names and
    /// non-positive quantities.
    pub fn from_entries(entries: &[CardEntry]) -> Self {
        Self::from_pairs(entries.iter().map(|e| (e.name.as_str(), e.quantity)))
    }

    /// Same as [`DeckCounts::from_entries`] for raw `(name, quantity)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for (name, quantity) in pairs {
            if quantity <= 0 {
                continue;
            }
            let key = normalize_card_name(name);
            if key.is_empty() {
                continue;
            }
            let qty = u32::try_from(quantity).unwrap_or(u32::MAX);
            let slot = counts.entry(key).or_default();
            *slot = slot.saturating_add(qty);
        }
        Self(counts)
    }

    /// Copies of a normalized card name (0 when absent).
    pub fn get(&self, normalized: &str) -> u32 {
        self.0.get(normalized).copied().unwrap_or(0)
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.0.contains_key(normalized)
    }

    /// Total number of cards.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&q| q as u64).sum()
    }

    /// Number of distinct cards.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
