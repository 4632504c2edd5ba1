//! FILENAME: pivot-engine/tests/common/mod.rs
//! Shared fixtures for the pivot engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use pivot_engine::{EvalContext, GroupKey, PathId};
use records::{parse_timestamp, LeadFields, LeadRecord};

/// The fixed evaluation time used by every fixture.
pub fn now() -> DateTime<Utc> {
    parse_timestamp("2024-06-15T12:00:00Z").unwrap()
}

pub fn ctx() -> EvalContext {
    EvalContext::new(now(), LeadFields::default())
}

pub fn days_from_now(days: i64) -> String {
    (now() + Duration::days(days)).to_rfc3339()
}

pub fn path(keys: &[&str]) -> PathId {
    let keys: Vec<GroupKey> = keys.iter().map(|k| GroupKey::value(*k)).collect();
    PathId::from_keys(&keys).unwrap()
}

/// Ten leads over three statuses and four sources.
pub struct LeadFixture;

impl LeadFixture {
    /// (status, source, value, created, closing offset in days from now)
    pub fn data() -> Vec<(&'static str, &'static str, f64, &'static str, Option<i64>)> {
        vec![
            ("New", "Web", 1200.0, "2024-01-03", Some(20)),
            ("New", "Ads", 300.0, "2024-01-17", None),
            ("New", "Web", 450.0, "2024-02-10", Some(-2)),
            ("Qualified", "Referral", 5000.0, "2024-02-21", Some(10)),
            ("Qualified", "Event", 2500.0, "2024-03-05", Some(-30)),
            ("Qualified", "Web", 800.0, "2024-04-12", None),
            ("Won", "Referral", 12000.0, "2023-11-30", Some(-60)),
            ("Won", "Referral", 7000.0, "2024-01-08", Some(-45)),
            ("Won", "Ads", 950.0, "2024-03-28", Some(-1)),
            ("Won", "Event", 3100.0, "2024-05-02", Some(-10)),
        ]
    }

    pub fn records() -> Vec<LeadRecord> {
        Self::data()
            .into_iter()
            .map(|(status, source, value, created, closing)| {
                let mut record = LeadRecord::new()
                    .with("status", status)
                    .with("source", source)
                    .with("value", value)
                    .with("created_at", created);
                if let Some(days) = closing {
                    record.insert("closing_date", days_from_now(days));
                }
                record
            })
            .collect()
    }
}
