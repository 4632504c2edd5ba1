//! FILENAME: pivot-engine/src/resolver.rs
//! Field Resolver - extracts the group key of a record for one dimension.
//!
//! Date-valued fields are bucketed by granularity (computed in UTC), every
//! other field groups by its raw display text. A missing, empty or
//! unparseable value resolves to `GroupKey::Undefined`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use icu_collator::{Collator, CollatorOptions, Strength};
use records::LeadRecord;
use serde::{Deserialize, Serialize};

use crate::definition::{DateGranularity, DimensionCatalog, DimensionSpec};

/// Label shown for records that have no usable value for a dimension.
pub const UNDEFINED_LABEL: &str = "(undefined)";

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// GROUP KEY
// ============================================================================

/// The key a record is grouped under at one tree level.
/// `Undefined` never equals a `Value`, even one whose text is the sentinel label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Value(String),
    Undefined,
}

impl GroupKey {
    pub fn value(s: impl Into<String>) -> Self {
        GroupKey::Value(s.into())
    }

    pub fn label(&self) -> &str {
        match self {
            GroupKey::Value(s) => s,
            GroupKey::Undefined => UNDEFINED_LABEL,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, GroupKey::Undefined)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        locale_cmp(self.label(), other.label())
            .then_with(|| self.is_undefined().cmp(&other.is_undefined()))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

thread_local! {
    /// Root-locale collator at tertiary strength: base letters, then accents,
    /// then case.
    static COLLATOR: Option<Collator> = {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        Collator::try_new(&Default::default(), options).ok()
    };
}

/// Locale-aware label ordering. Labels that collate equal fall back to the
/// raw text so the order stays total and deterministic.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let collated = COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => folded_cmp(a, b),
    });
    collated.then_with(|| a.cmp(b))
}

/// Case-folded comparison used when no collation data is available.
fn folded_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Date(DateGranularity),
}

/// A dimension bound to its catalog information, ready to resolve records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResolver {
    spec: DimensionSpec,
    kind: FieldKind,
}

impl FieldResolver {
    pub fn new(spec: &DimensionSpec, catalog: &DimensionCatalog) -> Self {
        let kind = if catalog.is_date_field(spec) {
            // A date field without granularity buckets by day
            FieldKind::Date(spec.granularity.unwrap_or(DateGranularity::Day))
        } else {
            FieldKind::Text
        };
        FieldResolver {
            spec: spec.clone(),
            kind,
        }
    }

    pub fn spec(&self) -> &DimensionSpec {
        &self.spec
    }

    pub fn is_date(&self) -> bool {
        matches!(self.kind, FieldKind::Date(_))
    }

    pub fn resolve(&self, record: &LeadRecord) -> GroupKey {
        match self.kind {
            FieldKind::Text => record
                .text(&self.spec.field)
                .map(GroupKey::Value)
                .unwrap_or(GroupKey::Undefined),
            FieldKind::Date(granularity) => record
                .timestamp(&self.spec.field)
                .map(|ts| GroupKey::Value(date_bucket_label(ts, granularity)))
                .unwrap_or(GroupKey::Undefined),
        }
    }
}

/// Resolves the group key of `record` for `spec`.
pub fn resolve(record: &LeadRecord, spec: &DimensionSpec, catalog: &DimensionCatalog) -> GroupKey {
    FieldResolver::new(spec, catalog).resolve(record)
}

/// Same as `resolve`, returning the display label.
pub fn resolve_label(
    record: &LeadRecord,
    spec: &DimensionSpec,
    catalog: &DimensionCatalog,
) -> String {
    resolve(record, spec, catalog).label().to_string()
}

/// Formats the bucket label of a timestamp for a granularity.
/// Week is the within-month index `ceil(day / 7)`, not an ISO week number.
pub fn date_bucket_label(ts: DateTime<Utc>, granularity: DateGranularity) -> String {
    let year = ts.year();
    let month0 = ts.month0();
    match granularity {
        DateGranularity::Year => format!("{:04}", year),
        DateGranularity::Quarter => format!("Q{} {:04}", month0 / 3 + 1, year),
        DateGranularity::Month => format!("{:02}/{:04}", month0 + 1, year),
        DateGranularity::Week => format!(
            "W{} {} {:04}",
            (ts.day() + 6) / 7,
            MONTH_ABBREVS[month0 as usize],
            year
        ),
        DateGranularity::Day => format!("{:02}/{:02}/{:04}", month0 + 1, ts.day(), year),
    }
}
