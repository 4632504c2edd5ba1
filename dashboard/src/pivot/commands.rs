//! FILENAME: dashboard/src/pivot/commands.rs
//! PURPOSE: Session commands for the lead pivot report.
//! CONTEXT: Every command locks the session, applies one change and
//! recomputes the view from scratch over the current snapshot.

use std::path::Path;
use std::sync::{MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use pivot_engine::{
    build, calculate_pivot, drill_down, expand_to_depth, DateGranularity, DimensionSpec, MeasureId,
    MeasureSpec, PathId, PivotConfig, PivotError,
};
use records::LeadRecord;

use crate::error::SessionError;
use crate::loader::{load_config_json, load_records_json};
use crate::pivot::types::*;
use crate::{log_debug, log_enter, log_exit, log_info, log_warn};

// ============================================================================
// HELPERS
// ============================================================================

fn lock(state: &PivotState) -> MutexGuard<'_, PivotSession> {
    state.session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn compute_view(session: &PivotSession) -> Result<PivotViewResponse, SessionError> {
    let view = calculate_pivot(
        &session.records,
        &session.config,
        &session.expansion,
        &session.dimension_catalog,
        session.now(),
    )?;
    log_debug!(
        "PIVOT",
        "view v{}: {} rows over {} records",
        session.version,
        view.row_count(),
        session.records.len()
    );
    Ok(PivotViewResponse::from_view(&view, session.version))
}

fn parse_granularity(granularity: Option<&str>) -> Result<Option<DateGranularity>, SessionError> {
    Ok(granularity.map(str::parse::<DateGranularity>).transpose()?)
}

/// Drops a granularity the field cannot use.
fn dimension_for(
    session: &PivotSession,
    field: &str,
    granularity: Option<DateGranularity>,
) -> Result<DimensionSpec, SessionError> {
    let entry = session
        .dimension_catalog
        .get(field)
        .ok_or_else(|| PivotError::UnknownDimension(field.to_string()))?;
    Ok(DimensionSpec {
        field: field.to_string(),
        granularity: if entry.supports_granularity {
            granularity
        } else {
            None
        },
    })
}

fn check_index(session: &PivotSession, index: usize) -> Result<(), SessionError> {
    if index < session.config.rows.len() {
        Ok(())
    } else {
        Err(SessionError::DimensionIndex(index))
    }
}

// ============================================================================
// DATA AND CONFIGURATION
// ============================================================================

/// Replaces the record snapshot. Expansion state is kept.
pub fn set_records(
    state: &PivotState,
    records: Vec<LeadRecord>,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    log_info!("PIVOT", "set_records count={}", records.len());
    session.records = records;
    session.touch();
    compute_view(&session)
}

/// Replaces the whole configuration after validating it.
pub fn set_config(
    state: &PivotState,
    config: PivotConfig,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    if let Err(e) = config.validate(&session.dimension_catalog) {
        log_warn!("PIVOT", "set_config rejected: {}", e);
        return Err(e.into());
    }
    session.config = config;
    session.touch();
    compute_view(&session)
}

/// Pins the evaluation time used by `overdue`; `None` returns to the wall clock.
pub fn set_reference_time(state: &PivotState, now: Option<DateTime<Utc>>) {
    let mut session = lock(state);
    session.now_override = now;
    session.touch();
}

pub fn load_records_file(
    state: &PivotState,
    path: &Path,
) -> Result<PivotViewResponse, SessionError> {
    let records = load_records_json(path)?;
    set_records(state, records)
}

pub fn load_config_file(
    state: &PivotState,
    path: &Path,
) -> Result<PivotViewResponse, SessionError> {
    let config = load_config_json(path)?;
    set_config(state, config)
}

// ============================================================================
// ROW DIMENSIONS
// ============================================================================

/// Appends a row dimension as the new innermost level.
pub fn add_row_dimension(
    state: &PivotState,
    field: &str,
    granularity: Option<&str>,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    let granularity = parse_granularity(granularity)?;
    let dim = dimension_for(&session, field, granularity)?;
    log_info!(
        "PIVOT",
        "add_row_dimension field={} granularity={:?}",
        field,
        dim.granularity
    );

    session.config.rows.push(dim);
    session.touch();
    compute_view(&session)
}

pub fn remove_row_dimension(
    state: &PivotState,
    index: usize,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    check_index(&session, index)?;
    let removed = session.config.rows.remove(index);
    log_info!(
        "PIVOT",
        "remove_row_dimension index={} field={}",
        index,
        removed.field
    );

    session.touch();
    compute_view(&session)
}

/// Moves the dimension at `from` so that it ends up at position `to`.
pub fn move_row_dimension(
    state: &PivotState,
    from: usize,
    to: usize,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    check_index(&session, from)?;
    check_index(&session, to)?;

    let dim = session.config.rows.remove(from);
    session.config.rows.insert(to, dim);
    log_info!("PIVOT", "move_row_dimension {} -> {}", from, to);

    session.touch();
    compute_view(&session)
}

/// Sets or clears the date granularity of the dimension at `index`.
pub fn set_granularity(
    state: &PivotState,
    index: usize,
    granularity: Option<&str>,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    check_index(&session, index)?;
    let granularity = parse_granularity(granularity)?;
    let field = session.config.rows[index].field.clone();
    let dim = dimension_for(&session, &field, granularity)?;
    log_info!(
        "PIVOT",
        "set_granularity index={} granularity={:?}",
        index,
        dim.granularity
    );

    session.config.rows[index] = dim;
    session.touch();
    compute_view(&session)
}

// ============================================================================
// MEASURES
// ============================================================================

/// Adds or removes a measure column. Selected columns stay in catalog order
/// and the last remaining measure cannot be removed.
pub fn toggle_measure(
    state: &PivotState,
    measure_id: &str,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    let id: MeasureId = measure_id.parse()?;
    let measures = &mut session.config.measures;

    if let Some(pos) = measures.iter().position(|m| m.id == id) {
        if measures.len() == 1 {
            log_warn!(
                "PIVOT",
                "toggle_measure refused to remove last measure {}",
                id
            );
            return Err(SessionError::LastMeasure);
        }
        measures.remove(pos);
        log_info!("PIVOT", "toggle_measure removed {}", id);
    } else {
        measures.push(MeasureSpec::new(id));
        measures.sort_by_key(|m| m.id.catalog_index());
        log_info!("PIVOT", "toggle_measure added {}", id);
    }

    session.touch();
    compute_view(&session)
}

// ============================================================================
// EXPANSION
// ============================================================================

/// Flips the expansion of the group with the given encoded path.
pub fn toggle_group(
    state: &PivotState,
    path_id: &str,
) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    let expanded = session.expansion.toggle(&PathId::from_encoded(path_id));
    log_info!(
        "PIVOT",
        "toggle_group path={} expanded={}",
        path_id,
        expanded
    );

    session.touch();
    compute_view(&session)
}

/// Expands every group above `depth`; 1 opens the root groups.
pub fn expand_level(
    state: &PivotState,
    depth: usize,
) -> Result<PivotViewResponse, SessionError> {
    log_enter!("PIVOT", "expand_level", "depth={}", depth);
    let mut guard = lock(state);
    let session = &mut *guard;
    {
        let mut tree = build(
            &session.records,
            &session.config.rows,
            &session.dimension_catalog,
        );
        expand_to_depth(&mut tree, &mut session.expansion, depth);
    }
    log_exit!(
        "PIVOT",
        "expand_level",
        "expanded_paths={}",
        session.expansion.len()
    );

    session.touch();
    compute_view(session)
}

pub fn collapse_all(state: &PivotState) -> Result<PivotViewResponse, SessionError> {
    let mut session = lock(state);
    session.expansion.clear();
    log_info!("PIVOT", "collapse_all");

    session.touch();
    compute_view(&session)
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn get_pivot_view(state: &PivotState) -> Result<PivotViewResponse, SessionError> {
    let session = lock(state);
    compute_view(&session)
}

/// Returns the records behind one group.
pub fn drill_down_group(
    state: &PivotState,
    path_id: &str,
) -> Result<Vec<LeadRecord>, SessionError> {
    log_enter!("PIVOT", "drill_down_group", "path={}", path_id);
    let session = lock(state);
    let mut tree = build(
        &session.records,
        &session.config.rows,
        &session.dimension_catalog,
    );
    let records = drill_down(&mut tree, &PathId::from_encoded(path_id))
        .ok_or_else(|| SessionError::UnknownGroup(path_id.to_string()))?;
    log_exit!("PIVOT", "drill_down_group", "records={}", records.len());
    Ok(records.into_iter().cloned().collect())
}

/// Dimension and measure catalogs with the current measure selection.
pub fn get_catalogs(state: &PivotState) -> CatalogResponse {
    let session = lock(state);
    let measures = session
        .measure_catalog
        .entries
        .iter()
        .map(|entry| MeasureOption {
            id: entry.id.clone(),
            label: entry.label.clone(),
            selected: session
                .config
                .measures
                .iter()
                .any(|m| m.id.id() == entry.id),
        })
        .collect();

    CatalogResponse {
        dimensions: session.dimension_catalog.entries.clone(),
        measures,
        granularities: CatalogResponse::granularity_options(),
    }
}
