//! FILENAME: dashboard/src/pivot/types.rs
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use pivot_engine::{
    CatalogEntry, DateGranularity, DimensionCatalog, ExpansionState, MeasureCatalog, PivotConfig,
    PivotRow, PivotRowType, PivotView,
};
use records::LeadRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// SESSION STATE
// ============================================================================

/// Everything one open pivot report needs between calls.
#[derive(Debug, Default)]
pub struct PivotSession {
    /// Snapshot of the lead list; replaced wholesale, never edited.
    pub records: Vec<LeadRecord>,
    pub config: PivotConfig,
    /// Survives configuration changes and record refreshes.
    pub expansion: ExpansionState,
    pub dimension_catalog: DimensionCatalog,
    pub measure_catalog: MeasureCatalog,
    /// Fixed evaluation time; `None` means the wall clock.
    pub now_override: Option<DateTime<Utc>>,
    /// Bumped on every change to records, configuration or expansion.
    pub version: u64,
}

impl PivotSession {
    pub fn now(&self) -> DateTime<Utc> {
        self.now_override.unwrap_or_else(Utc::now)
    }

    pub fn touch(&mut self) {
        self.version += 1;
    }
}

/// Shared state for the pivot commands.
#[derive(Debug, Default)]
pub struct PivotState {
    pub session: Mutex<PivotSession>,
}

impl PivotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PivotConfig) -> Self {
        PivotState {
            session: Mutex::new(PivotSession {
                config,
                ..PivotSession::default()
            }),
        }
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Response containing the pivot view data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotViewResponse {
    pub version: u64,
    pub row_count: usize,
    pub dimension_labels: Vec<String>,
    pub measure_labels: Vec<String>,
    pub rows: Vec<PivotRowData>,
    pub grand_total: PivotRowData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotRowData {
    pub view_row: usize,
    /// "group" or "grand_total"
    pub row_type: String,
    pub label: String,
    pub depth: usize,
    /// Encoded group path, passed back to `toggle_group` and `drill_down_group`.
    pub path_id: Option<String>,
    pub is_expandable: bool,
    pub is_expanded: bool,
    pub record_count: usize,
    pub values: Vec<f64>,
    pub formatted_values: Vec<String>,
}

impl PivotRowData {
    pub fn from_row(view_row: usize, row: &PivotRow) -> Self {
        let row_type = match row.row_type {
            PivotRowType::Group => "group",
            PivotRowType::GrandTotal => "grand_total",
        };
        PivotRowData {
            view_row,
            row_type: row_type.to_string(),
            label: row.label.clone(),
            depth: row.depth,
            path_id: row.path_id.as_ref().map(|p| p.as_str().to_string()),
            is_expandable: row.is_expandable,
            is_expanded: row.is_expanded,
            record_count: row.record_count,
            values: row.values.iter().map(|v| v.value).collect(),
            formatted_values: row.values.iter().map(|v| v.formatted.clone()).collect(),
        }
    }
}

impl PivotViewResponse {
    pub fn from_view(view: &PivotView, version: u64) -> Self {
        let rows: Vec<PivotRowData> = view
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| PivotRowData::from_row(i, row))
            .collect();
        PivotViewResponse {
            version,
            row_count: rows.len(),
            dimension_labels: view.dimension_labels.clone(),
            measure_labels: view.measure_labels.clone(),
            grand_total: PivotRowData::from_row(rows.len(), &view.grand_total),
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GranularityOption {
    pub id: String,
    pub label: String,
}

/// A measure catalog entry with the current selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub dimensions: Vec<CatalogEntry>,
    pub measures: Vec<MeasureOption>,
    pub granularities: Vec<GranularityOption>,
}

impl CatalogResponse {
    pub fn granularity_options() -> Vec<GranularityOption> {
        DateGranularity::ALL
            .iter()
            .map(|g| GranularityOption {
                id: g.id().to_string(),
                label: g.label().to_string(),
            })
            .collect()
    }
}
