//! Consolidation run orchestration.
//!
//! The run is a single forward pass: build the canonical schema once, then for
//! each source (in source-identifier order) align and route every canonical
//! table, then merge the pools and assemble the output bundle. Output is only
//! written after every stage has succeeded, so a fatal error never leaves a
//! partial master workbook behind.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    align::{MissingColumns, TableIdentity, align},
    category::{CategoryRouter, OrgChartRemainder},
    cli::ConsolidateArgs,
    config::ConsolidateConfig,
    error::ConsolidateError,
    merge::{RowPools, SourceContribution, merge},
    output::MasterOutput,
    schema::{self, CanonicalSchema},
    special::{self, SummaryLayout},
    table,
    workbook::{self, SheetSource, XlsxWorkbook},
};

/// Settings that drive the per-source pass.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub header_row: usize,
    pub glossary_table: String,
    pub summary_table: String,
    pub summary: SummaryLayout,
    pub org_chart_remainder: OrgChartRemainder,
}

impl PipelineSettings {
    pub fn from_config(config: &ConsolidateConfig) -> Self {
        Self {
            header_row: config.header_row,
            glossary_table: config.glossary_table.clone(),
            summary_table: config.summary_table.clone(),
            summary: config.summary_layout(),
            org_chart_remainder: config.org_chart_remainder,
        }
    }

    fn router(&self) -> CategoryRouter {
        CategoryRouter::new(&self.summary.source_column, self.org_chart_remainder)
    }
}

/// Result of a consolidation run before anything is written.
#[derive(Debug)]
pub struct Consolidation {
    pub output: MasterOutput,
    pub missing: Vec<MissingColumns>,
    pub source_count: usize,
}

/// Processes every canonical table of one source document.
pub fn process_source(
    source: &mut dyn SheetSource,
    source_id: &str,
    schema: &CanonicalSchema,
    settings: &PipelineSettings,
    router: &CategoryRouter,
) -> Result<SourceContribution> {
    let mut contribution = SourceContribution {
        source: source_id.to_string(),
        ..SourceContribution::default()
    };
    let mut main_pieces = Vec::new();

    for table in schema.tables() {
        if table.name == settings.glossary_table {
            contribution.glossary = Some(special::read_glossary(
                source,
                &table.name,
                settings.header_row,
            )?);
            continue;
        }
        if table.name == settings.summary_table {
            contribution.summary = Some(special::read_summary(
                source,
                &table.name,
                &table.columns,
                source_id,
                &settings.summary,
            )?);
            continue;
        }

        let raw = source
            .read_tabular_sheet(&table.name, settings.header_row)
            .with_context(|| {
                format!(
                    "Reading table '{}' from source '{source_id}' ({:?})",
                    table.name,
                    source.document()
                )
            })?;
        let identity = TableIdentity {
            source: source_id,
            table: &table.name,
        };
        let (aligned, missing) = align(&raw, &table.columns, identity);
        contribution.missing.extend(missing);

        let routed = router.classify(&aligned)?;
        main_pieces.extend(routed.main);
        contribution.org_chart.extend(routed.org_chart);
        contribution.schedule_matrix.extend(routed.schedule_matrix);
    }

    contribution.main = router.combine_main(source_id, main_pieces);
    Ok(contribution)
}

/// Runs the per-source pass over `sources`, then merges and assembles.
///
/// Sources are opened lazily; the first failure aborts the run.
pub fn consolidate<I, S>(
    schema: &CanonicalSchema,
    sources: I,
    settings: &PipelineSettings,
) -> Result<Consolidation>
where
    I: IntoIterator<Item = Result<(String, S)>>,
    S: SheetSource,
{
    if schema.is_empty() {
        warn!("Canonical schema declares no tables; every source will contribute only its identifier");
    }
    let router = settings.router();
    let mut pools = RowPools::new();
    for entry in sources {
        let (source_id, mut source) = entry?;
        info!("Reading {:?} (source = {source_id})", source.document());
        let contribution = process_source(&mut source, &source_id, schema, settings, &router)
            .with_context(|| format!("Processing source '{source_id}'"))?;
        pools = pools.absorb(contribution);
    }

    let missing = pools.missing_columns().cloned().collect::<Vec<_>>();
    let source_count = pools.source_count();
    let merged = merge(pools, &router, &settings.summary)?;
    Ok(Consolidation {
        output: MasterOutput::assemble(merged),
        missing,
        source_count,
    })
}

/// Entry point for the `consolidate` command.
pub fn execute(args: &ConsolidateArgs) -> Result<()> {
    let mut config = ConsolidateConfig::load(&args.config)
        .with_context(|| format!("Loading configuration from {:?}", args.config))?;
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    if let Some(header_row) = args.header_row {
        config.header_row = header_row;
    }

    let (schema, _report) = schema::load(&config.reference_file)?;
    let documents = workbook::list_source_documents(
        &config.source_folder,
        &config.source_pattern,
        &config.source_marker,
    )?;
    if documents.is_empty() {
        return Err(ConsolidateError::Configuration(format!(
            "no source documents matching '{}' in {:?}",
            config.source_pattern, config.source_folder
        ))
        .into());
    }
    info!("Found {} workbook(s):", documents.len());
    for document in &documents {
        info!("  {:?} (source = {})", document.path, document.identifier);
    }

    let settings = PipelineSettings::from_config(&config);
    let sources = documents.iter().map(|document| {
        XlsxWorkbook::open(&document.path).map(|book| (document.identifier.clone(), book))
    });
    let consolidation = consolidate(&schema, sources, &settings)?;

    if !consolidation.missing.is_empty() {
        info!(
            "{} source table(s) were missing canonical columns and were null-filled",
            consolidation.missing.len()
        );
    }

    if args.dry_run {
        let headers = ["sheet", "rows", "columns"].map(String::from).to_vec();
        let rows = consolidation
            .output
            .sheets()
            .map(|(name, frame)| {
                vec![
                    name.to_string(),
                    frame.height().to_string(),
                    frame.width().to_string(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
        info!("Dry run: {:?} was not written", config.output_file);
        return Ok(());
    }

    consolidation.output.write(&config.output_file)
}
