//! FILENAME: dashboard/tests/common/mod.rs
//! Test harness and fixtures for dashboard session tests.

#![allow(dead_code)]

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use dashboard_lib::{set_records, set_reference_time, PivotState};
use records::{parse_timestamp, LeadRecord};
use tempfile::NamedTempFile;

pub fn now() -> DateTime<Utc> {
    parse_timestamp("2024-06-15T12:00:00Z").unwrap()
}

/// Session state with the fixture leads loaded and the clock pinned.
pub struct TestHarness {
    pub state: PivotState,
}

impl TestHarness {
    pub fn new() -> Self {
        let state = PivotState::new();
        set_reference_time(&state, Some(now()));
        TestHarness { state }
    }

    pub fn with_leads() -> Self {
        let harness = Self::new();
        set_records(&harness.state, LeadFixture::records()).unwrap();
        harness
    }
}

/// Six leads over two statuses and three sources.
pub struct LeadFixture;

impl LeadFixture {
    /// (status, source, value, closing offset in days from now)
    pub fn data() -> Vec<(&'static str, &'static str, f64, Option<i64>)> {
        vec![
            ("Open", "Web", 1000.0, Some(-3)),
            ("Open", "Ads", 250.0, Some(12)),
            ("Open", "Web", 750.0, None),
            ("Won", "Referral", 4000.0, Some(-20)),
            ("Won", "Web", 1500.0, Some(-1)),
            ("Won", "Referral", 500.0, Some(8)),
        ]
    }

    pub fn records() -> Vec<LeadRecord> {
        Self::data()
            .into_iter()
            .map(|(status, source, value, closing)| {
                let mut record = LeadRecord::new()
                    .with("status", status)
                    .with("source", source)
                    .with("value", value)
                    .with("created_at", "2024-05-01T08:00:00Z");
                if let Some(days) = closing {
                    record.insert("closing_date", (now() + Duration::days(days)).to_rfc3339());
                }
                record
            })
            .collect()
    }

    pub fn json() -> String {
        serde_json::to_string(&Self::records()).unwrap()
    }
}

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
