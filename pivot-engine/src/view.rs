//! FILENAME: pivot-engine/src/view.rs
//! Pivot View - Renderable output for the dashboard.
//!
//! Rows carry everything a renderer needs (label, indent depth, expand
//! affordance, formatted values) and keep the raw numbers next to the
//! formatted strings.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::MeasureId;
use crate::tree::PathId;

/// Label of the grand-total row.
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// The type of a row in the pivot view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotRowType {
    /// A group at some tree depth.
    Group,
    /// The aggregate of the full record set.
    GrandTotal,
}

/// One computed measure cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureValue {
    pub id: MeasureId,
    pub value: f64,
    pub formatted: String,
}

/// Inline capacity covers the whole measure catalog.
pub type MeasureValues = SmallVec<[MeasureValue; 6]>;

/// A single displayable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub label: String,

    /// Indent level (0 = root groups and the grand total).
    pub depth: usize,

    /// Identity of the group; `None` for the grand total.
    pub path_id: Option<PathId>,

    pub row_type: PivotRowType,

    /// Whether a further dimension exists below this row.
    pub is_expandable: bool,

    pub is_expanded: bool,

    /// Number of records aggregated into this row.
    pub record_count: usize,

    /// One entry per selected measure, in column order.
    pub values: MeasureValues,
}

impl PivotRow {
    pub fn value_of(&self, id: MeasureId) -> Option<&MeasureValue> {
        self.values.iter().find(|v| v.id == id)
    }

    pub fn formatted_values(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.formatted.as_str()).collect()
    }

    pub fn is_grand_total(&self) -> bool {
        self.row_type == PivotRowType::GrandTotal
    }
}

/// The complete calculated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotView {
    /// Header of each row dimension, outer to inner.
    pub dimension_labels: Vec<String>,

    /// Header of each measure column.
    pub measure_labels: Vec<String>,

    /// Visible group rows in display order.
    pub rows: Vec<PivotRow>,

    pub grand_total: PivotRow,
}

impl PivotView {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn find_row(&self, path: &PathId) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.path_id.as_ref() == Some(path))
    }
}
