//! Amount canonicalization.
//!
//! Every amount the pipeline stores goes through [`normalize_amount`] (or its
//! signed twin for balances). Anything that does not survive as a plain
//! decimal becomes the absent sentinel instead of an error.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{CANONICAL_DECIMAL, DECIMAL_AMOUNT, NUMERIC_AMOUNT};
use crate::models::ABSENT;

/// Token shape accepted as an amount during token scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountShape {
    /// Must carry two decimal places (`1,234.56`).
    Decimal,
    /// Any digit run with optional decimals; OCR often drops the point.
    Numeric,
}

impl AmountShape {
    /// Check whether a raw token looks like an amount of this shape.
    pub fn matches(&self, token: &str) -> bool {
        let cleaned = strip_token_noise(token);
        if cleaned.is_empty() {
            return false;
        }
        match self {
            AmountShape::Decimal => DECIMAL_AMOUNT.is_match(&cleaned),
            AmountShape::Numeric => NUMERIC_AMOUNT.is_match(&cleaned.replace(',', "")),
        }
    }
}

/// Remove bracket and currency residue OCR leaves around amount tokens.
fn strip_token_noise(token: &str) -> String {
    token
        .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '|' | '₹'))
        .trim_start_matches("Rs.")
        .trim_start_matches("INR")
        .to_string()
}

/// Canonicalize an unsigned amount string.
///
/// Grouping separators, currency markers and `Cr`/`Dr` suffixes are dropped.
/// Returns `None` for blanks, the sentinel, or anything that is not a plain
/// decimal once cleaned.
pub fn normalize_amount(raw: &str) -> Option<String> {
    parse_decimal(raw).map(format_amount)
}

/// Canonicalize an amount, storing the sentinel when it does not parse.
pub fn normalize_or_absent(raw: &str) -> String {
    normalize_amount(raw).unwrap_or_else(|| ABSENT.to_string())
}

/// Canonicalize a balance, keeping a leading `-` for overdrawn balances.
pub fn normalize_signed(raw: &str) -> Option<String> {
    parse_signed(raw).map(format_amount)
}

pub fn normalize_signed_or_absent(raw: &str) -> String {
    normalize_signed(raw).unwrap_or_else(|| ABSENT.to_string())
}

/// Parse an amount string, ignoring any sign.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ABSENT {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !CANONICAL_DECIMAL.is_match(&cleaned) {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Parse an amount string honouring a leading `-` or a trailing `Dr`.
pub fn parse_signed(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let value = parse_decimal(trimmed)?;

    let lower = trimmed.to_ascii_lowercase();
    let negative = lower.starts_with('-') || lower.ends_with("dr");

    Some(if negative { -value } else { value })
}

/// Render a decimal with exactly two places.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// True for a canonical amount that parses to zero.
pub fn is_zero(amount: &str) -> bool {
    parse_decimal(amount).is_some_and(|d| d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_normalize_strips_grouping() {
        assert_eq!(normalize_amount("1,234.56"), Some("1234.56".to_string()));
        assert_eq!(normalize_amount("12,34,567.00"), Some("1234567.00".to_string()));
        assert_eq!(normalize_amount("500"), Some("500.00".to_string()));
    }

    #[test]
    fn test_normalize_strips_currency_noise() {
        assert_eq!(normalize_amount("INR 2,500.00"), Some("2500.00".to_string()));
        assert_eq!(normalize_amount("₹ 99.5"), Some("99.50".to_string()));
        assert_eq!(normalize_amount("1,000.00 Cr"), Some("1000.00".to_string()));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("-"), None);
        assert_eq!(normalize_amount("N/A"), None);
        assert_eq!(normalize_amount("1.2.3"), None);
        assert_eq!(normalize_or_absent("abc"), "-");
    }

    #[test]
    fn test_signed_balance() {
        assert_eq!(normalize_signed("1,500.00 Dr"), Some("-1500.00".to_string()));
        assert_eq!(normalize_signed("-250.00"), Some("-250.00".to_string()));
        assert_eq!(normalize_signed("250.00Cr"), Some("250.00".to_string()));
        assert_eq!(parse_signed("x"), None);
    }

    #[test]
    fn test_parse_decimal_value() {
        assert_eq!(parse_decimal("1,234.50"), Decimal::from_f64(1234.5));
        assert!(is_zero("0.00"));
        assert!(!is_zero("-"));
    }

    #[test]
    fn test_amount_shapes() {
        assert!(AmountShape::Decimal.matches("1,234.56"));
        assert!(AmountShape::Decimal.matches("(1,234.56)"));
        assert!(!AmountShape::Decimal.matches("1234"));
        assert!(!AmountShape::Decimal.matches("01-07-2025"));
        assert!(AmountShape::Numeric.matches("1,234"));
        assert!(AmountShape::Numeric.matches("1234.5)"));
        assert!(!AmountShape::Numeric.matches("UPI/123"));
        assert!(!AmountShape::Numeric.matches("-"));
    }
}
