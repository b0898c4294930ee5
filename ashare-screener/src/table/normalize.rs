//! Numeric normalization of raw cells.
//!
//! This is the only place that turns a raw cell into a number. Filter,
//! scoring and ranking all call [`to_number`] so that "missing" means the same
//! thing everywhere.

use super::Cell;

/// Text values that mean "no data".
///
/// Compared case-insensitively after trimming.
pub const NO_DATA_SENTINELS: &[&str] = &["-", "--", "—", "——", "n/a", "none", "null", "nan"];

/// Noise stripped from textual numbers before parsing.
///
/// The `亿` unit marker is removed without rescaling; callers that care about
/// units convert separately.
const NOISE: &[char] = &['%', ',', '亿'];

/// Coerce a cell to a finite number, or `None` for missing.
///
/// Never panics.
pub fn to_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Missing => None,
        Cell::Number(n) => finite(*n),
        Cell::Text(s) => parse_number(s),
    }
}

/// Parse a textual number after removing sentinels and noise.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || is_sentinel(trimmed) {
        return None;
    }

    let cleaned: String = trimmed.chars().filter(|c| !NOISE.contains(c)).collect();
    cleaned.trim().parse::<f64>().ok().and_then(finite)
}

fn is_sentinel(text: &str) -> bool {
    NO_DATA_SENTINELS
        .iter()
        .any(|sentinel| sentinel.eq_ignore_ascii_case(text))
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
