//! FILENAME: pivot-engine/src/engine.rs
//! Pivot Engine - turns records and a configuration into a renderable view.
//!
//! Algorithm:
//! 1. Build the root level of the group tree for the row dimensions
//! 2. Walk the tree depth-first, emitting one row per node; children are
//!    built and visited only for expanded nodes
//! 3. Evaluate and format every selected measure for each emitted row
//! 4. Compute the grand total straight from the full record set, never from
//!    tree nodes, so it cannot drift from the data

use chrono::{DateTime, Utc};
use records::LeadRecord;

use crate::definition::{DimensionCatalog, FormatOptions, MeasureSpec, PivotConfig};
use crate::error::PivotError;
use crate::expansion::ExpansionState;
use crate::format::format_measure;
use crate::measure::{evaluate, EvalContext};
use crate::resolver::FieldResolver;
use crate::tree::{build, GroupNode, GroupTree, PathId};
use crate::view::{
    MeasureValue, MeasureValues, PivotRow, PivotRowType, PivotView, GRAND_TOTAL_LABEL,
};

// ============================================================================
// ROW PROJECTION
// ============================================================================

/// Evaluates and formats every measure over `records`.
fn measure_values<'r, I>(
    records: I,
    measures: &[MeasureSpec],
    ctx: &EvalContext,
    format: &FormatOptions,
) -> MeasureValues
where
    I: IntoIterator<Item = &'r LeadRecord> + Clone,
{
    measures
        .iter()
        .map(|m| {
            let value = evaluate(records.clone(), m.id, ctx);
            MeasureValue {
                id: m.id,
                value,
                formatted: format_measure(value, m.id, format),
            }
        })
        .collect()
}

/// Produces the visible rows of `tree`, depth-first.
/// Nodes are collapsed unless their path is in `expansion`.
pub fn project(
    tree: &mut GroupTree<'_>,
    expansion: &ExpansionState,
    measures: &[MeasureSpec],
    ctx: &EvalContext,
    format: &FormatOptions,
) -> Vec<PivotRow> {
    let mut rows = Vec::new();
    let (resolvers, roots) = tree.parts_mut();
    project_nodes(
        roots,
        resolvers,
        expansion,
        measures,
        ctx,
        format,
        &mut rows,
    );

    log::debug!(
        "projected {} rows ({} expanded paths)",
        rows.len(),
        expansion.len()
    );
    rows
}

fn project_nodes(
    nodes: &mut [GroupNode<'_>],
    resolvers: &[FieldResolver],
    expansion: &ExpansionState,
    measures: &[MeasureSpec],
    ctx: &EvalContext,
    format: &FormatOptions,
    rows: &mut Vec<PivotRow>,
) {
    for node in nodes.iter_mut() {
        let is_expandable = node.depth + 1 < resolvers.len();
        let is_expanded = is_expandable && expansion.is_expanded(&node.path_id);

        rows.push(PivotRow {
            label: node.label().to_string(),
            depth: node.depth,
            path_id: Some(node.path_id.clone()),
            row_type: PivotRowType::Group,
            is_expandable,
            is_expanded,
            record_count: node.records.len(),
            values: measure_values(node.records.iter().copied(), measures, ctx, format),
        });

        if is_expanded {
            let children = node.materialize_children(resolvers);
            project_nodes(children, resolvers, expansion, measures, ctx, format, rows);
        }
    }
}

/// The grand-total row over the full record set.
pub fn grand_total(
    records: &[LeadRecord],
    measures: &[MeasureSpec],
    ctx: &EvalContext,
    format: &FormatOptions,
) -> PivotRow {
    PivotRow {
        label: GRAND_TOTAL_LABEL.to_string(),
        depth: 0,
        path_id: None,
        row_type: PivotRowType::GrandTotal,
        is_expandable: false,
        is_expanded: false,
        record_count: records.len(),
        values: measure_values(records.iter(), measures, ctx, format),
    }
}

// ============================================================================
// TREE OPERATIONS
// ============================================================================

/// Returns the records behind the group at `path`, or `None` if no such group.
pub fn drill_down<'a>(tree: &mut GroupTree<'a>, path: &PathId) -> Option<Vec<&'a LeadRecord>> {
    tree.node_at(path).map(|node| node.records.clone())
}

/// Marks every node above `depth` expanded, so rows down to `depth` are visible.
/// `depth` 0 expands nothing.
pub fn expand_to_depth(tree: &mut GroupTree<'_>, expansion: &mut ExpansionState, depth: usize) {
    let (resolvers, roots) = tree.parts_mut();
    expand_nodes(roots, resolvers, expansion, depth);
}

fn expand_nodes(
    nodes: &mut [GroupNode<'_>],
    resolvers: &[FieldResolver],
    expansion: &mut ExpansionState,
    depth: usize,
) {
    for node in nodes.iter_mut() {
        if node.depth >= depth || node.depth + 1 >= resolvers.len() {
            continue;
        }
        expansion.expand(node.path_id.clone());
        let children = node.materialize_children(resolvers);
        expand_nodes(children, resolvers, expansion, depth);
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates the pivot view for a record snapshot.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(
    records: &[LeadRecord],
    config: &PivotConfig,
    expansion: &ExpansionState,
    catalog: &DimensionCatalog,
    now: DateTime<Utc>,
) -> Result<PivotView, PivotError> {
    if let Err(e) = config.validate(catalog) {
        log::warn!("rejected pivot configuration: {}", e);
        return Err(e);
    }

    let ctx = EvalContext::new(now, config.fields.clone());
    let mut tree = build(records, &config.rows, catalog);
    let rows = project(&mut tree, expansion, &config.measures, &ctx, &config.format);
    let total = grand_total(records, &config.measures, &ctx, &config.format);

    Ok(PivotView {
        dimension_labels: config.rows.iter().map(|d| catalog.label_for(d)).collect(),
        measure_labels: config
            .measures
            .iter()
            .map(|m| m.display_label().to_string())
            .collect(),
        rows,
        grand_total: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DimensionSpec, MeasureId};
    use crate::resolver::GroupKey;
    use records::{parse_timestamp, LeadFields};

    fn lead(status: &str, source: &str, value: f64) -> LeadRecord {
        LeadRecord::new()
            .with("status", status)
            .with("source", source)
            .with("value", value)
    }

    fn create_test_records() -> Vec<LeadRecord> {
        vec![
            lead("Won", "Web", 100.0),
            lead("Won", "Referral", 250.0),
            lead("Lost", "Web", 80.0),
            lead("New", "Ads", 40.0),
        ]
    }

    fn create_test_config() -> PivotConfig {
        PivotConfig::new(
            vec![DimensionSpec::new("status"), DimensionSpec::new("source")],
            vec![
                MeasureSpec::new(MeasureId::Count),
                MeasureSpec::new(MeasureId::SumValue),
            ],
        )
    }

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-06-01").unwrap()
    }

    fn path(keys: &[&str]) -> PathId {
        let keys: Vec<GroupKey> = keys.iter().map(|k| GroupKey::value(*k)).collect();
        PathId::from_keys(&keys).unwrap()
    }

    #[test]
    fn test_basic_pivot_calculation() {
        let records = create_test_records();
        let view = calculate_pivot(
            &records,
            &create_test_config(),
            &ExpansionState::new(),
            &DimensionCatalog::default(),
            now(),
        )
        .unwrap();

        let labels: Vec<&str> = view.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Lost", "New", "Won"]);
        assert!(view.rows.iter().all(|r| r.is_expandable && !r.is_expanded));
        assert_eq!(view.measure_labels, vec!["Leads", "Total Value"]);
        assert_eq!(view.dimension_labels, vec!["Status", "Source"]);
        assert_eq!(view.grand_total.formatted_values(), vec!["4", "470 €"]);
    }

    #[test]
    fn test_no_row_fields() {
        let records = create_test_records();
        let mut config = create_test_config();
        config.rows.clear();

        let view = calculate_pivot(
            &records,
            &config,
            &ExpansionState::new(),
            &DimensionCatalog::default(),
            now(),
        )
        .unwrap();

        assert_eq!(view.row_count(), 0);
        assert_eq!(view.grand_total.record_count, 4);
        assert!(view.grand_total.is_grand_total());
    }

    #[test]
    fn test_no_measures_is_rejected() {
        let records = create_test_records();
        let mut config = create_test_config();
        config.measures.clear();

        let result = calculate_pivot(
            &records,
            &config,
            &ExpansionState::new(),
            &DimensionCatalog::default(),
            now(),
        );
        assert_eq!(result, Err(PivotError::NoMeasures));
    }

    #[test]
    fn test_expanded_node_shows_children_after_itself() {
        let records = create_test_records();
        let config = create_test_config();
        let mut expansion = ExpansionState::new();
        expansion.toggle(&path(&["Won"]));

        let view = calculate_pivot(
            &records,
            &config,
            &expansion,
            &DimensionCatalog::default(),
            now(),
        )
        .unwrap();

        let summary: Vec<(&str, usize)> = view
            .rows
            .iter()
            .map(|r| (r.label.as_str(), r.depth))
            .collect();
        assert_eq!(
            summary,
            vec![("Lost", 0), ("New", 0), ("Won", 0), ("Referral", 1), ("Web", 1)]
        );
        let won = view.find_row(&path(&["Won"])).unwrap();
        assert!(won.is_expanded);
        let leaf = view.find_row(&path(&["Won", "Web"])).unwrap();
        assert!(!leaf.is_expandable);
        assert_eq!(leaf.value_of(MeasureId::SumValue).unwrap().value, 100.0);
    }

    #[test]
    fn test_single_level_is_never_expandable() {
        let records = create_test_records();
        let mut config = create_test_config();
        config.rows.truncate(1);
        let mut expansion = ExpansionState::new();
        expansion.toggle(&path(&["Won"]));

        let view = calculate_pivot(
            &records,
            &config,
            &expansion,
            &DimensionCatalog::default(),
            now(),
        )
        .unwrap();

        assert_eq!(view.row_count(), 3);
        assert!(view.rows.iter().all(|r| !r.is_expandable && !r.is_expanded));
    }

    #[test]
    fn test_collapsed_children_are_not_built() {
        let records = create_test_records();
        let config = create_test_config();
        let catalog = DimensionCatalog::default();
        let ctx = EvalContext::new(now(), LeadFields::default());
        let mut tree = build(&records, &config.rows, &catalog);
        let mut expansion = ExpansionState::new();
        expansion.expand(path(&["Lost"]));

        project(
            &mut tree,
            &expansion,
            &config.measures,
            &ctx,
            &config.format,
        );

        for root in tree.roots() {
            assert_eq!(root.children.is_some(), root.label() == "Lost");
        }
    }

    #[test]
    fn test_drill_down() {
        let records = create_test_records();
        let config = create_test_config();
        let catalog = DimensionCatalog::default();
        let mut tree = build(&records, &config.rows, &catalog);

        let won = drill_down(&mut tree, &path(&["Won"])).unwrap();
        assert_eq!(won.len(), 2);
        let won_referral = drill_down(&mut tree, &path(&["Won", "Referral"])).unwrap();
        assert_eq!(won_referral.len(), 1);
        assert_eq!(won_referral[0].number("value"), Some(250.0));
        assert!(drill_down(&mut tree, &path(&["Pending"])).is_none());
    }

    #[test]
    fn test_expand_to_depth() {
        let records = create_test_records();
        let mut config = create_test_config();
        config.rows.push(DimensionSpec::new("owner"));
        let catalog = DimensionCatalog::default();
        let ctx = EvalContext::new(now(), LeadFields::default());

        let mut tree = build(&records, &config.rows, &catalog);
        let mut expansion = ExpansionState::new();
        expand_to_depth(&mut tree, &mut expansion, 1);
        // Only the three status groups
        assert_eq!(expansion.len(), 3);

        let rows = project(
            &mut tree,
            &expansion,
            &config.measures,
            &ctx,
            &config.format,
        );
        assert_eq!(rows.len(), 3 + 4);
        assert!(rows.iter().all(|r| r.depth <= 1));

        expand_to_depth(&mut tree, &mut expansion, 5);
        let rows = project(
            &mut tree,
            &expansion,
            &config.measures,
            &ctx,
            &config.format,
        );
        // status (3) + source (4) + owner (4, all undefined)
        assert_eq!(rows.len(), 3 + 4 + 4);
    }
}
