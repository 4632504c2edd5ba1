//! FILENAME: pivot-engine/src/format.rs
//! Formatter - renders a measure value to display text.

use records::{format_currency, format_decimal, format_integer};

use crate::definition::{FormatOptions, MeasureId};

/// Formats `value` the way the measure is displayed.
pub fn format_measure(value: f64, measure: MeasureId, options: &FormatOptions) -> String {
    match measure {
        MeasureId::Count | MeasureId::Overdue => format_integer(value),
        MeasureId::SumValue | MeasureId::WeightedValue | MeasureId::ExpectedRevenue => {
            format_currency(
                value,
                options.currency_decimals,
                &options.currency_symbol,
                options.currency_position,
            )
        }
        MeasureId::DaysToClose => {
            let days = format_decimal(value, 1, true);
            if options.days_suffix.is_empty() {
                days
            } else {
                format!("{} {}", days, options.days_suffix)
            }
        }
    }
}
