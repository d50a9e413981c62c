use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Consolidate drifting per-entity workbooks into one canonical master workbook",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the canonical schema, reconcile every source workbook, and write the master workbook
    Consolidate(ConsolidateArgs),
    /// Print the canonical schema declared by the reference workbook
    Schema(SchemaArgs),
    /// List the source workbooks that would be consolidated, in processing order
    Sources(SourcesArgs),
}

#[derive(Debug, Args)]
pub struct ConsolidateArgs {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Output workbook (overrides `output_file` from the configuration)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Zero-based header row of source sheets (overrides `header_row`)
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// Run every stage but skip writing; print the resulting sheet shapes
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Reference workbook declaring Table/Column pairs
    #[arg(short, long, conflicts_with = "config", required_unless_present = "config")]
    pub reference: Option<PathBuf>,
    /// YAML configuration file naming the reference workbook
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}
