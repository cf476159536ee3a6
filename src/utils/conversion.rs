//! Decimal parsing and formatting utilities.
//!
//! The source reports amounts as decimal strings. They are parsed straight into
//! `BigDecimal` so sums over thousands of events stay exact.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};

// ============================================
// Parsing
// ============================================

/// Parse a decimal string (e.g. `"1234.5678"`, `"-0.1"`, `"1e-7"`).
///
/// # Arguments
/// * `field` - Field name, used in the error message
/// * `value` - The string as delivered by the source
pub fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| format!("{field}: invalid decimal {value:?} ({e})"))
}

/// Parse an unsigned integer string (timestamps, fee tiers, decimals).
pub fn parse_u64(field: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("{field}: invalid integer {value:?} ({e})"))
}

// ============================================
// Formatting
// ============================================

/// Format a USD amount with a fixed number of decimal places (half-up rounding).
///
/// # Example
/// ```ignore
/// assert_eq!(format_usd(&BigDecimal::from_str("30.754").unwrap(), 2), "30.75");
/// ```
pub fn format_usd(value: &BigDecimal, places: i64) -> String {
    value.with_scale_round(places, RoundingMode::HalfUp).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_is_exact() {
        let a = parse_decimal("amountUSD", "0.1").unwrap();
        let b = parse_decimal("amountUSD", "0.2").unwrap();
        assert_eq!(a + b, parse_decimal("amountUSD", "0.3").unwrap());
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        let err = parse_decimal("amountUSD", "12abc").unwrap_err();
        assert!(err.starts_with("amountUSD"));
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("timestamp", " 1700000000 ").unwrap(), 1_700_000_000);
        assert!(parse_u64("timestamp", "-1").is_err());
    }

    #[test]
    fn test_format_usd_rounds_half_up() {
        assert_eq!(format_usd(&parse_decimal("x", "30.754").unwrap(), 2), "30.75");
        assert_eq!(format_usd(&parse_decimal("x", "30.755").unwrap(), 2), "30.76");
        assert_eq!(format_usd(&parse_decimal("x", "10.5").unwrap(), 4), "10.5000");
    }
}
