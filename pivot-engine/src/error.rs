//! FILENAME: pivot-engine/src/error.rs

use thiserror::Error;

/// Contract violations detected when a pivot is configured or calculated.
/// Malformed record data never produces one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error("Unknown measure: {0}")]
    UnknownMeasure(String),

    #[error("Unknown dimension field: {0}")]
    UnknownDimension(String),

    #[error("Unknown date granularity: {0}")]
    UnknownGranularity(String),

    #[error("At least one measure must be selected")]
    NoMeasures,
}
