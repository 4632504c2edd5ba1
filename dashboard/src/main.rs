//! Lead pivot CLI - print a pivot report for a JSON lead list
//!
//! Usage:
//!   lead-pivot --records <leads.json> [--config <pivot.json>] [--expand <depth>]
//!
//! Examples:
//!   lead-pivot --records leads.json --row status --row source --expand 1
//!   lead-pivot --records leads.json --row created_at:quarter --measure count --measure overdue

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use dashboard_lib::logging::{init_log_file, init_logger};
use dashboard_lib::{
    add_row_dimension, expand_level, get_catalogs, get_pivot_view, load_config_file,
    load_records_file, log_info, set_reference_time, toggle_measure, PivotRowData, PivotState,
    PivotViewResponse, SessionError,
};
use pivot_engine::MeasureId;

#[derive(Parser)]
#[command(name = "lead-pivot")]
#[command(about = "Group a lead list by dimensions and print per-group measures")]
#[command(version)]
struct Cli {
    /// JSON file with an array of lead records
    #[arg(short, long)]
    records: PathBuf,

    /// JSON pivot configuration (rows, measures, fields, format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Row dimension to append, as `field` or `field:granularity`
    #[arg(long = "row")]
    rows: Vec<String>,

    /// Measure to select; replaces the configured measures when given
    #[arg(short, long = "measure")]
    measures: Vec<String>,

    /// Expand groups down to this depth
    #[arg(short, long, default_value_t = 0)]
    expand: usize,

    /// Evaluation time for overdue measures (RFC 3339), defaults to now
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Write the unified log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Echo debug logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<(), SessionError> {
    let cli = Cli::parse();

    init_logger(cli.verbose)?;
    if let Some(path) = &cli.log_file {
        init_log_file(path)?;
    }

    let state = PivotState::new();
    set_reference_time(&state, cli.now);
    if let Some(path) = &cli.config {
        load_config_file(&state, path)?;
    }
    load_records_file(&state, &cli.records)?;

    for row in &cli.rows {
        let (field, granularity) = match row.split_once(':') {
            Some((field, granularity)) => (field, Some(granularity)),
            None => (row.as_str(), None),
        };
        add_row_dimension(&state, field, granularity)?;
    }

    if !cli.measures.is_empty() {
        select_measures(&state, &cli.measures)?;
    }

    let view = if cli.expand > 0 {
        expand_level(&state, cli.expand)?
    } else {
        get_pivot_view(&state)?
    };
    log_info!("CLI", "rendering {} rows", view.row_count);

    match cli.output {
        OutputFormat::Table => print!("{}", render_table(&view)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
    }
    Ok(())
}

/// Makes the selection exactly `wanted`. Wanted measures are added before the
/// others are removed, so the selection never drops to zero.
fn select_measures(state: &PivotState, wanted: &[String]) -> Result<(), SessionError> {
    let wanted: Vec<MeasureId> = wanted
        .iter()
        .map(|m| m.parse::<MeasureId>())
        .collect::<Result<_, _>>()?;

    for id in &wanted {
        if !is_selected(state, *id) {
            toggle_measure(state, id.id())?;
        }
    }
    for id in MeasureId::ALL {
        if is_selected(state, id) && !wanted.contains(&id) {
            toggle_measure(state, id.id())?;
        }
    }
    Ok(())
}

fn is_selected(state: &PivotState, id: MeasureId) -> bool {
    get_catalogs(state)
        .measures
        .iter()
        .any(|m| m.selected && m.id == id.id())
}

fn render_row(row: &PivotRowData, label_width: usize) -> String {
    let marker = if row.is_expandable {
        if row.is_expanded {
            "- "
        } else {
            "+ "
        }
    } else {
        "  "
    };
    let label = format!("{}{}{}", "  ".repeat(row.depth), marker, row.label);
    let mut line = format!("{:<width$}", label, width = label_width);
    for value in &row.formatted_values {
        line.push_str(&format!(" {:>16}", value));
    }
    line
}

fn render_table(view: &PivotViewResponse) -> String {
    let label_width = view
        .rows
        .iter()
        .chain(std::iter::once(&view.grand_total))
        .map(|r| r.label.chars().count() + 2 * r.depth + 2)
        .chain(std::iter::once(view.dimension_labels.join(" > ").chars().count()))
        .max()
        .unwrap_or(0);

    let header = view.dimension_labels.join(" > ");
    let mut out = format!("{:<width$}", header, width = label_width);
    for label in &view.measure_labels {
        out.push_str(&format!(" {:>16}", label));
    }
    out.push('\n');
    for row in &view.rows {
        out.push_str(&render_row(row, label_width));
        out.push('\n');
    }
    out.push_str(&render_row(&view.grand_total, label_width));
    out.push('\n');
    out
}
