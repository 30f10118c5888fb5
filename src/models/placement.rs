//! Tournament placement parsing and weighting.

use std::sync::LazyLock;

use regex::Regex;

static TOP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btop\s*(\d+)").unwrap());
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:-|–|—|to)\s*(\d+)").unwrap());
static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:st|nd|rd|th)\b").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Parse a free-form standing into the best place it implies.
///
/// `"Winner"` → 1, `"Top 8"` → 8, `"5-8"` → 5, `"2nd"` → 2, `"17"` → 17.
/// Returns `None` for anything without a usable number.
pub fn parse_placement(raw: &str) -> Option<u32> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if s.contains("winner") || s.contains("champion") {
        return Some(1);
    }

    let parsed = if let Some(caps) = TOP_RE.captures(&s) {
        caps[1].parse::<u32>().ok()
    } else if let Some(caps) = RANGE_RE.captures(&s) {
        let a = caps[1].parse::<u32>().ok();
        let b = caps[2].parse::<u32>().ok();
        match (a, b) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    } else if let Some(caps) = ORDINAL_RE.captures(&s) {
        caps[1].parse::<u32>().ok()
    } else {
        NUMBER_RE.find(&s).and_then(|m| m.as_str().parse::<u32>().ok())
    };

    parsed.filter(|&p| p > 0)
}

/// Weight of a finish when aggregating card choices.
///
/// Winners count fully; the weight steps down to 0.15 past the top 64.
pub fn placement_weight(placement: Option<u32>) -> f64 {
    match placement {
        Some(1) => 1.0,
        Some(2) => 0.9,
        Some(p) if p <= 4 => 0.8,
        Some(p) if p <= 8 => 0.65,
        Some(p) if p <= 16 => 0.5,
        Some(p) if p <= 32 => 0.35,
        Some(p) if p <= 64 => 0.25,
        Some(_) => 0.15,
        None => 0.2,
    }
}

/// Whether a placement is a top-8 finish.
pub fn is_top_cut(placement: Option<u32>) -> bool {
    placement.is_some_and(|p| p <= 8)
}
