//! FILENAME: records/src/number_format.rs
//! PURPOSE: Number formatting utilities for displaying aggregated values.
//! CONTEXT: Presentation only. Callers keep the raw `f64` and use these
//! helpers to produce the display string next to it.

use serde::{Deserialize, Serialize};

/// Where the currency symbol is placed relative to the amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    /// `€1,250`
    Before,
    /// `1,250 €`
    #[default]
    After,
}

/// Format a number as a plain integer (rounded, no separators).
pub fn format_integer(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    // -0.4 rounds to "-0"
    if rounded == "-0" {
        "0".to_string()
    } else {
        rounded
    }
}

/// Format a number with specified decimal places and optional thousands separator.
pub fn format_decimal(value: f64, decimal_places: u8, use_thousands_separator: bool) -> String {
    let rounded = format!("{:.prec$}", value, prec = decimal_places as usize);

    if use_thousands_separator {
        add_thousands_separator(&rounded)
    } else {
        rounded
    }
}

/// Add thousands separators to a numeric string.
pub fn add_thousands_separator(s: &str) -> String {
    let parts: Vec<&str> = s.split('.').collect();
    let integer_part = parts[0];
    let decimal_part = parts.get(1);

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::new();
    let len = digits.len();

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if negative {
        result = format!("-{}", result);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}

/// Format a number as currency.
pub fn format_currency(
    value: f64,
    decimal_places: u8,
    symbol: &str,
    position: CurrencyPosition,
) -> String {
    let formatted = add_thousands_separator(&format!(
        "{:.prec$}",
        value.abs(),
        prec = decimal_places as usize
    ));

    let with_symbol = match position {
        CurrencyPosition::Before => format!("{}{}", symbol, formatted),
        CurrencyPosition::After => format!("{} {}", formatted, symbol),
    };

    // Rounded-away amounts such as -0.2 at zero decimals must not show a sign
    let is_zero = formatted.chars().all(|c| c == '0' || c == ',' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", with_symbol)
    } else {
        with_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_separator() {
        assert_eq!(add_thousands_separator("1234567"), "1,234,567");
        assert_eq!(add_thousands_separator("-1234.50"), "-1,234.50");
        assert_eq!(add_thousands_separator("999"), "999");
    }

    #[test]
    fn test_format_integer() {
        assert_eq!(format_integer(12.0), "12");
        assert_eq!(format_integer(-0.4), "0");
        assert_eq!(format_integer(12345.0), "12345");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(3.0, 1, false), "3.0");
        assert_eq!(format_decimal(1234.56, 1, true), "1,234.6");
    }

    #[test]
    fn test_format_currency_positions() {
        assert_eq!(CurrencyPosition::default(), CurrencyPosition::After);
        let euros = |v| format_currency(v, 0, "€", CurrencyPosition::After);
        assert_eq!(euros(1250.0), "1,250 €");
        assert_eq!(euros(-300.0), "-300 €");
        assert_eq!(euros(-0.2), "0 €");
        assert_eq!(
            format_currency(1250.5, 2, "$", CurrencyPosition::Before),
            "$1,250.50"
        );
    }
}
