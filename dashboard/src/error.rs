//! FILENAME: dashboard/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

/// Errors surfaced by the dashboard session and loaders.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Pivot configuration error: {0}")]
    Pivot(#[from] PivotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("At least one measure must stay selected")]
    LastMeasure,

    #[error("No row dimension at index {0}")]
    DimensionIndex(usize),

    #[error("No group with path '{0}'")]
    UnknownGroup(String),

    #[error("Invalid record data: {0}")]
    InvalidRecords(String),

    #[error("Logger setup failed: {0}")]
    Logger(String),
}
