//! FILENAME: dashboard/src/loader.rs
//! JSON loading of record snapshots and pivot configurations.

use std::fs;
use std::path::Path;

use pivot_engine::{DateGranularity, MeasureId, PivotConfig};
use records::{FieldValue, LeadRecord};
use serde_json::{Map, Value};

use crate::error::SessionError;
use crate::log_info;

/// Converts one JSON value to a field value.
/// Nested arrays and objects keep their JSON text; grouping treats them as opaque labels.
fn field_value(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Empty,
        Value::Bool(b) => FieldValue::Boolean(b),
        Value::Number(n) => n
            .as_f64()
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Empty),
        Value::String(s) => FieldValue::Text(s),
        other => FieldValue::Text(other.to_string()),
    }
}

fn record_from_object(object: Map<String, Value>) -> LeadRecord {
    object
        .into_iter()
        .map(|(field, value)| (field, field_value(value)))
        .collect()
}

/// Parses records from JSON text: either an array of objects or
/// an object with a `records` array.
pub fn parse_records(json: &str) -> Result<Vec<LeadRecord>, SessionError> {
    let items = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SessionError::InvalidRecords(
                    "expected an array or an object with a 'records' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(SessionError::InvalidRecords(
                "expected an array of record objects".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(object) => Ok(record_from_object(object)),
            _ => Err(SessionError::InvalidRecords(format!(
                "record {} is not an object",
                i
            ))),
        })
        .collect()
}

pub fn load_records_json(path: &Path) -> Result<Vec<LeadRecord>, SessionError> {
    let text = fs::read_to_string(path)?;
    let records = parse_records(&text)?;
    log_info!("LOAD", "loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Rejects unknown measure ids and granularities with their pivot error
/// before serde would fold them into a JSON error.
fn check_config_ids(value: &Value) -> Result<(), SessionError> {
    let strings = |list: &str, key: &str| -> Vec<String> {
        value
            .get(list)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get(key).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    };

    for id in strings("measures", "id") {
        id.parse::<MeasureId>()?;
    }
    for granularity in strings("rows", "granularity") {
        granularity.parse::<DateGranularity>()?;
    }
    Ok(())
}

pub fn load_config_json(path: &Path) -> Result<PivotConfig, SessionError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    check_config_ids(&value)?;
    let config: PivotConfig = serde_json::from_value(value)?;
    log_info!(
        "LOAD",
        "loaded config from {:?}: {} rows, {} measures",
        path,
        config.rows.len(),
        config.measures.len()
    );
    Ok(config)
}
