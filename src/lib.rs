pub mod align;
pub mod category;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod special;
pub mod table;
pub mod workbook;
pub mod yaml_provider;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::ConsolidateConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("xlsx_consolidate", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Consolidate(args) => pipeline::execute(&args),
        Commands::Schema(args) => handle_schema(&args),
        Commands::Sources(args) => handle_sources(&args),
    }
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let reference: PathBuf = match &args.reference {
        Some(path) => path.clone(),
        None => {
            let config = args
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
            ConsolidateConfig::load(&config)
                .with_context(|| format!("Loading configuration from {config:?}"))?
                .reference_file
        }
    };
    info!("Building canonical schema from {reference:?}");
    let (schema, report) = schema::load(&reference)?;

    let mut rows = Vec::new();
    for table in schema.tables() {
        for (idx, column) in table.columns.iter().enumerate() {
            rows.push(vec![table.name.clone(), (idx + 1).to_string(), column.clone()]);
        }
    }
    let headers = ["table", "#", "column"].map(String::from).to_vec();
    table::print_table(&headers, &rows);
    info!(
        "{} table(s), {} column(s); {} sheet(s) skipped, {} table(s) with duplicates",
        schema.len(),
        rows.len(),
        report.skipped_sheets.len(),
        report.duplicates.len()
    );
    Ok(())
}

fn handle_sources(args: &cli::SourcesArgs) -> Result<()> {
    let config = ConsolidateConfig::load(&args.config)
        .with_context(|| format!("Loading configuration from {:?}", args.config))?;
    let documents = workbook::list_source_documents(
        &config.source_folder,
        &config.source_pattern,
        &config.source_marker,
    )?;
    let rows = documents
        .iter()
        .enumerate()
        .map(|(idx, doc)| {
            vec![
                (idx + 1).to_string(),
                doc.identifier.clone(),
                doc.path.display().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let headers = ["#", "source", "path"].map(String::from).to_vec();
    table::print_table(&headers, &rows);
    info!(
        "{} source workbook(s) in {:?}",
        documents.len(),
        config.source_folder
    );
    Ok(())
}
