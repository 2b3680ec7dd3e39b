//! Parsing of raw text fields at the point of use.
//!
//! Fields hold whatever the user typed. A value that does not parse is not an
//! error, it just means "not computable yet", so both parsers return `Option`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a field as a finite `f64`.
pub fn parse_f64(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a field as an exact `Decimal`.
///
/// Plain decimal notation is read exactly; anything else that still parses as
/// a finite float (e.g. "1e3") is converted from its float value.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| parse_f64(trimmed).and_then(|v| Decimal::try_from(v).ok()))
}

/// Format a derived money/percent field to two decimals.
pub fn format_2dp(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
