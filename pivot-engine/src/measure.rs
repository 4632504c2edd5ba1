//! FILENAME: pivot-engine/src/measure.rs
//! Measure Evaluator - computes one scalar from a set of records.
//!
//! Every measure tolerates empty input and returns 0 for it.

use chrono::{DateTime, Utc};
use records::{whole_days_between, LeadFields, LeadRecord};

use crate::definition::MeasureId;

/// Probability weight applied by `weighted_value` and `expected_revenue`.
pub const WEIGHT_FACTOR: f64 = 0.5;

/// Inputs a measure needs besides the records.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalContext {
    /// Evaluation-time "now", compared against closing dates by `overdue`.
    pub now: DateTime<Utc>,
    pub fields: LeadFields,
}

impl EvalContext {
    pub fn new(now: DateTime<Utc>, fields: LeadFields) -> Self {
        EvalContext { now, fields }
    }

    /// Context evaluated against the wall clock.
    pub fn current(fields: LeadFields) -> Self {
        EvalContext::new(Utc::now(), fields)
    }
}

/// Running totals for one measure.
#[derive(Debug, Clone, Copy, Default)]
struct MeasureAccumulator {
    count: usize,
    sum: f64,
    qualifying: usize,
}

/// Evaluates `measure` over `records`.
pub fn evaluate<'r, I>(records: I, measure: MeasureId, ctx: &EvalContext) -> f64
where
    I: IntoIterator<Item = &'r LeadRecord>,
{
    let fields = &ctx.fields;
    let mut acc = MeasureAccumulator::default();

    for record in records {
        acc.count += 1;
        match measure {
            MeasureId::Count => {}
            MeasureId::SumValue => {
                acc.sum += fields.value_of(record).unwrap_or(0.0);
            }
            // Both share one formula. Kept identical until product decides
            // what expected revenue should weigh by.
            MeasureId::WeightedValue | MeasureId::ExpectedRevenue => {
                acc.sum += fields.value_of(record).unwrap_or(0.0) * WEIGHT_FACTOR;
            }
            MeasureId::Overdue => {
                if matches!(fields.closing_of(record), Some(closing) if closing < ctx.now) {
                    acc.qualifying += 1;
                }
            }
            MeasureId::DaysToClose => {
                // Without both dates the duration is undefined; skip the record
                if let (Some(created), Some(closing)) =
                    (fields.created_of(record), fields.closing_of(record))
                {
                    acc.sum += whole_days_between(created, closing) as f64;
                    acc.qualifying += 1;
                }
            }
        }
    }

    match measure {
        MeasureId::Count => acc.count as f64,
        MeasureId::SumValue | MeasureId::WeightedValue | MeasureId::ExpectedRevenue => acc.sum,
        MeasureId::Overdue => acc.qualifying as f64,
        MeasureId::DaysToClose => {
            if acc.qualifying > 0 {
                acc.sum / acc.qualifying as f64
            } else {
                0.0
            }
        }
    }
}
