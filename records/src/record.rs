//! FILENAME: records/src/record.rs
//! PURPOSE: The read-only lead record consumed by the pivot engine.
//! CONTEXT: A record is a flat mapping of field name to `FieldValue`. Every
//! accessor is optional: a missing, empty or unreadable field is `None`, and
//! the caller decides what "missing" means (sentinel label, zero, exclusion).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::{from_epoch_millis, parse_timestamp};
use crate::value::FieldValue;

/// A single lead as handed over by the lead list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl LeadRecord {
    pub fn new() -> Self {
        LeadRecord {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Display text of a field, `None` when absent or empty.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(FieldValue::display_value)
    }

    /// Numeric value of a field, `None` when absent or non-numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Timestamp of a date-like field, `None` when absent or unparseable.
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.get(field)? {
            FieldValue::Text(s) => parse_timestamp(s),
            FieldValue::Number(n) => from_epoch_millis(*n),
            FieldValue::Empty | FieldValue::Boolean(_) => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for LeadRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        LeadRecord {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Names of the well-known fields the measures read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFields {
    /// Deal value (currency amount).
    pub value: String,
    /// When the lead was created.
    pub created_date: String,
    /// Expected or actual closing date.
    pub closing_date: String,
}

impl Default for LeadFields {
    fn default() -> Self {
        LeadFields {
            value: "value".to_string(),
            created_date: "created_at".to_string(),
            closing_date: "closing_date".to_string(),
        }
    }
}

impl LeadFields {
    pub fn value_of(&self, record: &LeadRecord) -> Option<f64> {
        record.number(&self.value)
    }

    pub fn created_of(&self, record: &LeadRecord) -> Option<DateTime<Utc>> {
        record.timestamp(&self.created_date)
    }

    pub fn closing_of(&self, record: &LeadRecord) -> Option<DateTime<Utc>> {
        record.timestamp(&self.closing_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_json_object() {
        let record: LeadRecord = serde_json::from_str(
            r#"{"status": "New", "value": 1500, "closing_date": "2024-05-01", "notes": null}"#,
        )
        .unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(record.text("status").as_deref(), Some("New"));
        assert_eq!(record.number("value"), Some(1500.0));
        assert!(record.timestamp("closing_date").is_some());
        assert_eq!(record.text("notes"), None);
    }

    #[test]
    fn test_missing_fields_are_none() {
        let record = LeadRecord::new().with("status", "Won");
        assert_eq!(record.text("source"), None);
        assert_eq!(record.number("value"), None);
        assert_eq!(record.timestamp("closing_date"), None);
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let record = LeadRecord::new()
            .with("closing_date", "soon")
            .with("created_at", true);
        assert_eq!(record.timestamp("closing_date"), None);
        assert_eq!(record.timestamp("created_at"), None);
    }

    #[test]
    fn test_lead_fields_defaults_and_override() {
        let fields: LeadFields = serde_json::from_str(r#"{"value": "amount"}"#).unwrap();
        assert_eq!(fields.value, "amount");
        assert_eq!(fields.closing_date, "closing_date");

        let record = LeadRecord::new().with("amount", 42.0);
        assert_eq!(fields.value_of(&record), Some(42.0));
    }
}
