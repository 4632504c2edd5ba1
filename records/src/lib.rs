//! FILENAME: records/src/lib.rs
//! PURPOSE: Main library entry point for the lead record model.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod date;
pub mod number_format;
pub mod record;
pub mod value;

// Re-export commonly used types at the crate root
pub use date::{from_epoch_millis, parse_timestamp, whole_days_between, MILLIS_PER_DAY};
pub use number_format::{
    add_thousands_separator, format_currency, format_decimal, format_integer, CurrencyPosition,
};
pub use record::{LeadFields, LeadRecord};
pub use value::FieldValue;
