//! FILENAME: pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot report.
//! These structures are designed to be:
//! - Serializable (config files, the dashboard session)
//! - Cheap to clone (the session hands snapshots to each calculation)
//! - Immutable snapshots of user intent

use std::fmt;
use std::str::FromStr;

use records::{CurrencyPosition, LeadFields};
use serde::{Deserialize, Serialize};

use crate::error::PivotError;

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Time bucketing applied to a date-valued dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DateGranularity {
    Year,
    Quarter,
    Month,
    Week,
    Day,
}

impl DateGranularity {
    pub const ALL: [DateGranularity; 5] = [
        DateGranularity::Year,
        DateGranularity::Quarter,
        DateGranularity::Month,
        DateGranularity::Week,
        DateGranularity::Day,
    ];

    pub fn id(self) -> &'static str {
        match self {
            DateGranularity::Year => "year",
            DateGranularity::Quarter => "quarter",
            DateGranularity::Month => "month",
            DateGranularity::Week => "week",
            DateGranularity::Day => "day",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateGranularity::Year => "Year",
            DateGranularity::Quarter => "Quarter",
            DateGranularity::Month => "Month",
            DateGranularity::Week => "Week",
            DateGranularity::Day => "Day",
        }
    }
}

impl FromStr for DateGranularity {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateGranularity::ALL
            .into_iter()
            .find(|g| g.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PivotError::UnknownGranularity(s.to_string()))
    }
}

impl TryFrom<String> for DateGranularity {
    type Error = PivotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One row dimension of the pivot.
/// `granularity` only matters when `field` is date-valued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<DateGranularity>,
}

impl DimensionSpec {
    pub fn new(field: impl Into<String>) -> Self {
        DimensionSpec {
            field: field.into(),
            granularity: None,
        }
    }

    pub fn dated(field: impl Into<String>, granularity: DateGranularity) -> Self {
        DimensionSpec {
            field: field.into(),
            granularity: Some(granularity),
        }
    }
}

/// Formats the display name for a dimension, e.g. "Created (Quarter)".
pub fn format_dimension_label(field_name: &str, granularity: Option<DateGranularity>) -> String {
    match granularity {
        Some(g) => format!("{} ({})", field_name, g.label()),
        None => field_name.to_string(),
    }
}

// ============================================================================
// MEASURES
// ============================================================================

/// The fixed measure catalog. No user-defined measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum MeasureId {
    Count,
    SumValue,
    WeightedValue,
    ExpectedRevenue,
    Overdue,
    DaysToClose,
}

impl MeasureId {
    pub const ALL: [MeasureId; 6] = [
        MeasureId::Count,
        MeasureId::SumValue,
        MeasureId::WeightedValue,
        MeasureId::ExpectedRevenue,
        MeasureId::Overdue,
        MeasureId::DaysToClose,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MeasureId::Count => "count",
            MeasureId::SumValue => "sum_value",
            MeasureId::WeightedValue => "weighted_value",
            MeasureId::ExpectedRevenue => "expected_revenue",
            MeasureId::Overdue => "overdue",
            MeasureId::DaysToClose => "days_to_close",
        }
    }

    pub fn default_label(self) -> &'static str {
        match self {
            MeasureId::Count => "Leads",
            MeasureId::SumValue => "Total Value",
            MeasureId::WeightedValue => "Weighted Value",
            MeasureId::ExpectedRevenue => "Expected Revenue",
            MeasureId::Overdue => "Overdue",
            MeasureId::DaysToClose => "Avg. Days to Close",
        }
    }

    /// Position in the catalog, used to keep selected columns in catalog order.
    pub fn catalog_index(self) -> usize {
        MeasureId::ALL
            .iter()
            .position(|m| *m == self)
            .unwrap_or(MeasureId::ALL.len())
    }
}

impl fmt::Display for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MeasureId {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasureId::ALL
            .into_iter()
            .find(|m| m.id() == s.trim())
            .ok_or_else(|| PivotError::UnknownMeasure(s.to_string()))
    }
}

impl TryFrom<String> for MeasureId {
    type Error = PivotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A selected measure column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub id: MeasureId,
    /// Column header; empty means the catalog default.
    #[serde(default)]
    pub label: String,
}

impl MeasureSpec {
    pub fn new(id: MeasureId) -> Self {
        MeasureSpec {
            id,
            label: id.default_label().to_string(),
        }
    }

    /// Builds a spec from a textual identifier, rejecting unknown ids.
    pub fn parse(id: &str, label: Option<&str>) -> Result<Self, PivotError> {
        let id: MeasureId = id.parse()?;
        Ok(MeasureSpec {
            id,
            label: label.map(str::to_string).unwrap_or_default(),
        })
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            self.id.default_label()
        } else {
            &self.label
        }
    }
}

// ============================================================================
// FORMAT OPTIONS
// ============================================================================

/// Display options for measure values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub currency_symbol: String,
    pub currency_position: CurrencyPosition,
    pub currency_decimals: u8,
    /// Unit appended to `days_to_close`.
    pub days_suffix: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            currency_symbol: "€".to_string(),
            currency_position: CurrencyPosition::After,
            currency_decimals: 0,
            days_suffix: "d".to_string(),
        }
    }
}

// ============================================================================
// CATALOGS
// ============================================================================

/// A selectable option exposed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Field name (dimensions) or measure id.
    pub id: String,
    pub label: String,
    /// Whether the entry offers a date-granularity sub-menu.
    #[serde(default)]
    pub supports_granularity: bool,
}

impl CatalogEntry {
    pub fn new(id: &str, label: &str, supports_granularity: bool) -> Self {
        CatalogEntry {
            id: id.to_string(),
            label: label.to_string(),
            supports_granularity,
        }
    }
}

/// The dimensions a pivot may group by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl Default for DimensionCatalog {
    fn default() -> Self {
        DimensionCatalog {
            entries: vec![
                CatalogEntry::new("status", "Status", false),
                CatalogEntry::new("source", "Source", false),
                CatalogEntry::new("stage", "Stage", false),
                CatalogEntry::new("owner", "Owner", false),
                CatalogEntry::new("industry", "Industry", false),
                CatalogEntry::new("territory", "Territory", false),
                CatalogEntry::new("created_at", "Created", true),
                CatalogEntry::new("closing_date", "Closing Date", true),
            ],
        }
    }
}

impl DimensionCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        DimensionCatalog { entries }
    }

    pub fn get(&self, field: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Whether a field should be treated as date-valued.
    /// Fields outside the catalog are date-valued only when a granularity is requested.
    pub fn is_date_field(&self, spec: &DimensionSpec) -> bool {
        match self.get(&spec.field) {
            Some(entry) => entry.supports_granularity,
            None => spec.granularity.is_some(),
        }
    }

    /// Column header for a dimension.
    pub fn label_for(&self, spec: &DimensionSpec) -> String {
        let name = self
            .get(&spec.field)
            .map(|e| e.label.as_str())
            .unwrap_or(spec.field.as_str());
        let granularity = if self.is_date_field(spec) {
            spec.granularity
        } else {
            None
        };
        format_dimension_label(name, granularity)
    }
}

/// The measures offered to the UI. Mirrors `MeasureId::ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl Default for MeasureCatalog {
    fn default() -> Self {
        MeasureCatalog {
            entries: MeasureId::ALL
                .iter()
                .map(|m| CatalogEntry::new(m.id(), m.default_label(), false))
                .collect(),
        }
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// The complete, serializable configuration of a pivot report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// Row dimensions, ordered from outer to inner.
    #[serde(default)]
    pub rows: Vec<DimensionSpec>,

    /// Selected measure columns.
    #[serde(default = "default_measures")]
    pub measures: Vec<MeasureSpec>,

    /// Names of the fields the measures read.
    #[serde(default)]
    pub fields: LeadFields,

    #[serde(default)]
    pub format: FormatOptions,
}

fn default_measures() -> Vec<MeasureSpec> {
    vec![
        MeasureSpec::new(MeasureId::Count),
        MeasureSpec::new(MeasureId::SumValue),
    ]
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig {
            rows: Vec::new(),
            measures: default_measures(),
            fields: LeadFields::default(),
            format: FormatOptions::default(),
        }
    }
}

impl PivotConfig {
    pub fn new(rows: Vec<DimensionSpec>, measures: Vec<MeasureSpec>) -> Self {
        PivotConfig {
            rows,
            measures,
            ..PivotConfig::default()
        }
    }

    /// Checks the configuration against the dimension catalog.
    /// A granularity on a non-date field is not an error; it is ignored.
    pub fn validate(&self, catalog: &DimensionCatalog) -> Result<(), PivotError> {
        if self.measures.is_empty() {
            return Err(PivotError::NoMeasures);
        }
        for dim in &self.rows {
            if !catalog.contains(&dim.field) {
                return Err(PivotError::UnknownDimension(dim.field.clone()));
            }
        }
        Ok(())
    }

    pub fn has_measure(&self, id: MeasureId) -> bool {
        self.measures.iter().any(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_ids_round_trip_through_text() {
        for m in MeasureId::ALL {
            assert_eq!(m.id().parse::<MeasureId>().unwrap(), m);
        }
    }

    #[test]
    fn test_unknown_measure_is_rejected() {
        assert_eq!(
            "win_rate".parse::<MeasureId>(),
            Err(PivotError::UnknownMeasure("win_rate".to_string()))
        );
        assert!(MeasureSpec::parse("margin", None).is_err());
    }

    #[test]
    fn test_granularity_parse_is_case_insensitive() {
        assert_eq!(
            "Quarter".parse::<DateGranularity>(),
            Ok(DateGranularity::Quarter)
        );
        assert!("fortnight".parse::<DateGranularity>().is_err());
    }

    #[test]
    fn test_config_from_json_with_defaults() {
        let config: PivotConfig = serde_json::from_str(
            r#"{
                "rows": [
                    {"field": "status"},
                    {"field": "created_at", "granularity": "quarter"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.rows.len(), 2);
        assert_eq!(config.rows[1].granularity, Some(DateGranularity::Quarter));
        assert_eq!(config.measures, default_measures());
        assert_eq!(config.fields, LeadFields::default());
    }

    #[test]
    fn test_config_rejects_unknown_measure_id() {
        let result: Result<PivotConfig, _> =
            serde_json::from_str(r#"{"measures": [{"id": "margin"}]}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Unknown measure: margin"), "{}", message);
    }

    #[test]
    fn test_deserialize_uses_text_parsing() {
        let spec: DimensionSpec =
            serde_json::from_str(r#"{"field": "created_at", "granularity": "Month"}"#).unwrap();
        assert_eq!(spec.granularity, Some(DateGranularity::Month));

        let measure: MeasureSpec = serde_json::from_str(r#"{"id": "days_to_close"}"#).unwrap();
        assert_eq!(measure.id, MeasureId::DaysToClose);
        assert_eq!(
            serde_json::to_string(&MeasureId::SumValue).unwrap(),
            r#""sum_value""#
        );
    }

    #[test]
    fn test_validate() {
        let catalog = DimensionCatalog::default();
        let mut config = PivotConfig::new(
            vec![DimensionSpec::new("status")],
            vec![MeasureSpec::new(MeasureId::Count)],
        );
        assert!(config.validate(&catalog).is_ok());

        // Granularity on a text field is ignored, not rejected
        config.rows.push(DimensionSpec::dated("source", DateGranularity::Month));
        assert!(config.validate(&catalog).is_ok());

        config.rows.push(DimensionSpec::new("favourite_colour"));
        assert_eq!(
            config.validate(&catalog),
            Err(PivotError::UnknownDimension("favourite_colour".to_string()))
        );

        config.rows.clear();
        config.measures.clear();
        assert_eq!(config.validate(&catalog), Err(PivotError::NoMeasures));
    }

    #[test]
    fn test_dimension_labels() {
        let catalog = DimensionCatalog::default();
        assert_eq!(
            catalog.label_for(&DimensionSpec::dated("created_at", DateGranularity::Quarter)),
            "Created (Quarter)"
        );
        assert_eq!(
            catalog.label_for(&DimensionSpec::dated("status", DateGranularity::Quarter)),
            "Status"
        );
        assert_eq!(catalog.label_for(&DimensionSpec::new("region")), "region");
    }

    #[test]
    fn test_measure_display_label_falls_back_to_catalog() {
        let spec = MeasureSpec::parse("overdue", None).unwrap();
        assert_eq!(spec.display_label(), "Overdue");
        let spec = MeasureSpec::parse("overdue", Some("Late")).unwrap();
        assert_eq!(spec.display_label(), "Late");
    }
}
