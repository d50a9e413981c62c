//! Run-scoped row pools and the cross-source merge.
//!
//! Each source produces one [`SourceContribution`]. The pipeline hands it to
//! [`RowPools::absorb`], which owns all accumulated state for the run. Once
//! every source is in, [`merge`] stacks each category in source-identifier
//! order, independent of the order contributions arrived in, and applies the
//! per-category post-filters.

use anyhow::Result;
use log::{info, warn};

use crate::{
    align::MissingColumns,
    category::{CategoryRouter, ORG_CHART, SCHEDULE_MATRIX},
    error::ConsolidateError,
    frame::Frame,
    special::SummaryLayout,
};

pub const ORG_CHART_KEY: &str = "EmployeeID";
pub const SCHEDULE_MATRIX_KEY: &str = "ProjectID";

/// Everything one source document contributes to the run.
#[derive(Debug, Clone, Default)]
pub struct SourceContribution {
    pub source: String,
    pub main: Frame,
    pub org_chart: Vec<Frame>,
    pub schedule_matrix: Vec<Frame>,
    pub summary: Option<Frame>,
    pub glossary: Option<Frame>,
    pub missing: Vec<MissingColumns>,
}

/// Accumulated contributions for one run. Grows per source, consumed once by [`merge`].
#[derive(Debug, Default)]
pub struct RowPools {
    contributions: Vec<SourceContribution>,
}

impl RowPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(mut self, contribution: SourceContribution) -> Self {
        self.contributions.push(contribution);
        self
    }

    pub fn source_count(&self) -> usize {
        self.contributions.len()
    }

    /// Missing-column diagnostics gathered so far, in arrival order.
    pub fn missing_columns(&self) -> impl Iterator<Item = &MissingColumns> {
        self.contributions.iter().flat_map(|c| c.missing.iter())
    }
}

/// Final, post-filtered pools ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPools {
    pub main: Frame,
    pub glossary: Frame,
    pub org_chart: Frame,
    pub schedule_matrix: Frame,
    pub summary: Frame,
}

pub fn merge(pools: RowPools, router: &CategoryRouter, layout: &SummaryLayout) -> Result<MergedPools> {
    let mut contributions = pools.contributions;
    contributions.sort_by(|a, b| a.source.cmp(&b.source));

    let mut main = Vec::new();
    let mut org_chart = Vec::new();
    let mut schedule_matrix = Vec::new();
    let mut summary = Vec::new();
    let mut glossary: Option<(String, Frame)> = None;

    for contribution in contributions {
        let source = contribution.source;
        main.push((source.clone(), contribution.main));
        org_chart.extend(contribution.org_chart.into_iter().map(|f| (source.clone(), f)));
        schedule_matrix.extend(
            contribution
                .schedule_matrix
                .into_iter()
                .map(|f| (source.clone(), f)),
        );
        if let Some(frame) = contribution.summary {
            summary.push((source.clone(), frame));
        }
        if let Some(frame) = contribution.glossary {
            if let Some((previous, held)) = &glossary
                && *held != frame
            {
                warn!("Glossary from source '{source}' differs from the one read from '{previous}'; keeping '{source}'");
            }
            glossary = Some((source, frame));
        }
    }

    let main = stack("Main", main, Frame::new(vec![router.source_column().to_string()]))?;

    let mut org_chart = stack(ORG_CHART.name, org_chart, router.empty_pool(&ORG_CHART))?;
    let dropped = org_chart.drop_null_in(ORG_CHART_KEY);
    if dropped > 0 {
        info!("Dropped {dropped} {} row(s) with no {ORG_CHART_KEY}", ORG_CHART.name);
    }

    let mut schedule_matrix = stack(
        SCHEDULE_MATRIX.name,
        schedule_matrix,
        router.empty_pool(&SCHEDULE_MATRIX),
    )?;
    let dropped = schedule_matrix.drop_null_in(SCHEDULE_MATRIX_KEY);
    if dropped > 0 {
        info!(
            "Dropped {dropped} {} row(s) with no {SCHEDULE_MATRIX_KEY}",
            SCHEDULE_MATRIX.name
        );
    }

    let summary = stack(
        "AssessmentSummary",
        summary,
        Frame::new(vec![
            layout.source_column.clone(),
            layout.period_label_column.clone(),
        ]),
    )?;

    Ok(MergedPools {
        main,
        glossary: glossary.map(|(_, frame)| frame).unwrap_or_default(),
        org_chart,
        schedule_matrix,
        summary,
    })
}

/// Stacks frames row-wise. Every frame must carry the same column names as the
/// first one, in any physical order; otherwise the merge fails.
fn stack(category: &str, parts: Vec<(String, Frame)>, empty: Frame) -> Result<Frame> {
    let mut parts = parts.into_iter();
    let Some((_, first)) = parts.next() else {
        return Ok(empty);
    };
    let mut stacked = first;
    for (source, frame) in parts {
        let Some(reordered) = frame.reordered_to(&stacked.columns) else {
            return Err(ConsolidateError::Merge {
                category: category.to_string(),
                source_id: source,
                expected: stacked.columns.clone(),
                found: frame.columns,
            }
            .into());
        };
        stacked.rows.extend(reordered.rows);
    }
    Ok(stacked)
}
