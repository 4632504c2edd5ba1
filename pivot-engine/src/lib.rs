//! FILENAME: pivot-engine/src/lib.rs
//! Pivot report engine for the lead dashboard.
//!
//! Groups a flat set of lead records into an expandable tree over the chosen
//! row dimensions and computes the fixed measure catalog per group and for
//! the grand total. Depends on `records` only for the record model and the
//! number formatting helpers.
//!
//! Layers:
//! - `definition`: Serializable configuration and catalogs (what the report IS)
//! - `resolver`, `measure`, `format`: per-record keys, per-group scalars, display text
//! - `tree`, `expansion`: lazily grown group tree and the expanded-path set
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Projection and totals (HOW we calculate)

pub mod definition;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod format;
pub mod measure;
pub mod resolver;
pub mod tree;
pub mod view;

pub use definition::*;
pub use engine::{calculate_pivot, drill_down, expand_to_depth, grand_total, project};
pub use error::PivotError;
pub use expansion::ExpansionState;
pub use format::format_measure;
pub use measure::{evaluate, EvalContext, WEIGHT_FACTOR};
pub use resolver::{
    date_bucket_label, locale_cmp, resolve, resolve_label, FieldResolver, GroupKey,
    UNDEFINED_LABEL,
};
pub use tree::{build, GroupNode, GroupTree, PathId};
pub use view::*;
