//! Tables that bypass generic alignment: the glossary and the assessment summary.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    align::normalize_header,
    data::{Value, display_cell},
    frame::Frame,
    workbook::SheetSource,
};

/// Reads the glossary table verbatim: every column kept, no reconciliation.
pub fn read_glossary(source: &mut dyn SheetSource, table: &str, header_row: usize) -> Result<Frame> {
    source
        .read_tabular_sheet(table, header_row)
        .with_context(|| format!("Reading glossary sheet '{table}' from {:?}", source.document()))
}

/// Where the summary sheet keeps its reporting period and how tagged columns are named.
#[derive(Debug, Clone)]
pub struct SummaryLayout {
    pub header_row: usize,
    pub period_row: usize,
    pub period_column: usize,
    pub source_column: String,
    pub period_label_column: String,
}

/// Reads the summary table for one source.
///
/// The reporting period comes from a fixed cell read without header
/// interpretation. The table itself is restricted to the canonical columns the
/// sheet actually has, rows with any null are dropped, and each kept row is
/// tagged with the source identifier (first column) and the reporting period
/// (last column).
pub fn read_summary(
    source: &mut dyn SheetSource,
    table: &str,
    canonical: &[String],
    source_id: &str,
    layout: &SummaryLayout,
) -> Result<Frame> {
    let period = source
        .read_raw_cell(table, layout.period_row, layout.period_column)
        .with_context(|| {
            format!(
                "Reading reporting period at row {}, column {} of '{table}' in {:?}",
                layout.period_row,
                layout.period_column,
                source.document()
            )
        })?;
    debug!(
        "Source '{source_id}' reporting period: '{}'",
        display_cell(period.as_ref())
    );

    let mut raw = source
        .read_tabular_sheet(table, layout.header_row)
        .with_context(|| format!("Reading summary sheet '{table}' from {:?}", source.document()))?;
    raw.columns = raw.columns.iter().map(|c| normalize_header(c)).collect();

    let present = canonical
        .iter()
        .filter(|name| raw.column_index(&normalize_header(name)).is_some())
        .collect::<Vec<_>>();
    let mut summary = raw.select(
        &present
            .iter()
            .map(|name| normalize_header(name))
            .collect::<Vec<_>>(),
    )?;
    summary.columns = present.into_iter().cloned().collect();

    let dropped = summary.drop_rows_with_nulls();
    if dropped > 0 {
        info!("Dropped {dropped} incomplete summary row(s) from source '{source_id}'");
    }

    summary.insert_constant(0, &layout.source_column, Some(Value::String(source_id.to_string())));
    summary.push_constant(&layout.period_label_column, period);
    Ok(summary)
}
