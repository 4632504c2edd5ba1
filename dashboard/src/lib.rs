//! FILENAME: dashboard/src/lib.rs
//! PURPOSE: Pivot session for the lead dashboard.
//! CONTEXT: Holds the record snapshot, pivot configuration and expansion
//! state behind a mutex and exposes the commands the list view calls.

pub mod error;
pub mod loader;
pub mod logging;
pub mod pivot;

pub use error::SessionError;
pub use loader::{load_config_json, load_records_json, parse_records};
pub use pivot::{
    add_row_dimension, collapse_all, drill_down_group, expand_level, get_catalogs,
    get_pivot_view, load_config_file, load_records_file, move_row_dimension,
    remove_row_dimension, set_config, set_granularity, set_records, set_reference_time,
    toggle_group, toggle_measure, CatalogResponse, PivotRowData, PivotSession, PivotState,
    PivotViewResponse,
};
