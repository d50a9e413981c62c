//! Run configuration.
//!
//! Loaded from a YAML file. The key names used by earlier releases of the
//! consolidation scripts (`column_reference_file_name`,
//! `assessment_guide_folder_name`, `compiled_master_sheet`) are accepted as
//! aliases. Relative paths resolve against the configuration file's directory.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    category::OrgChartRemainder, error::ConsolidateError, special::SummaryLayout, yaml_provider,
};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellPosition {
    pub row: usize,
    pub column: usize,
}

impl Default for CellPosition {
    fn default() -> Self {
        Self { row: 2, column: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidateConfig {
    #[serde(alias = "column_reference_file_name")]
    pub reference_file: PathBuf,
    #[serde(alias = "assessment_guide_folder_name")]
    pub source_folder: PathBuf,
    #[serde(alias = "compiled_master_sheet")]
    pub output_file: PathBuf,
    #[serde(default = "default_source_pattern")]
    pub source_pattern: String,
    #[serde(default = "default_source_marker")]
    pub source_marker: String,
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default = "default_source_column")]
    pub source_column: String,
    #[serde(default = "default_glossary_table")]
    pub glossary_table: String,
    #[serde(default = "default_summary_table")]
    pub summary_table: String,
    #[serde(default)]
    pub reporting_period_cell: CellPosition,
    #[serde(default = "default_reporting_period_column")]
    pub reporting_period_column: String,
    #[serde(default)]
    pub org_chart_remainder: OrgChartRemainder,
}

fn default_source_pattern() -> String {
    "*.xls*".to_string()
}

fn default_source_marker() -> String {
    "assessment_guide_".to_string()
}

fn default_header_row() -> usize {
    4
}

fn default_source_column() -> String {
    "DevCo".to_string()
}

fn default_glossary_table() -> String {
    "Glossary&Definitions".to_string()
}

fn default_summary_table() -> String {
    "AssessmentSummary".to_string()
}

fn default_reporting_period_column() -> String {
    "ReportingPeriod".to_string()
}

impl ConsolidateConfig {
    /// Minimal configuration with every optional setting at its default.
    pub fn new(reference_file: PathBuf, source_folder: PathBuf, output_file: PathBuf) -> Self {
        Self {
            reference_file,
            source_folder,
            output_file,
            source_pattern: default_source_pattern(),
            source_marker: default_source_marker(),
            header_row: default_header_row(),
            source_column: default_source_column(),
            glossary_table: default_glossary_table(),
            summary_table: default_summary_table(),
            reporting_period_cell: CellPosition::default(),
            reporting_period_column: default_reporting_period_column(),
            org_chart_remainder: OrgChartRemainder::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConsolidateError::Configuration(format!(
                "configuration file {path:?} does not exist"
            ))
            .into());
        }
        let mut config: ConsolidateConfig = yaml_provider::load_from_path(path).map_err(|err| {
            ConsolidateError::Configuration(format!("cannot parse {path:?}: {err:#}"))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.validate()?;
        debug!("Effective configuration:\n{}", yaml_provider::to_string(&config)?);
        Ok(config)
    }

    /// Makes relative paths absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.reference_file,
            &mut self.source_folder,
            &mut self.output_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let blank = [
            ("source_pattern", &self.source_pattern),
            ("source_marker", &self.source_marker),
            ("source_column", &self.source_column),
            ("glossary_table", &self.glossary_table),
            ("summary_table", &self.summary_table),
            ("reporting_period_column", &self.reporting_period_column),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((key, _)) = blank {
            return Err(ConsolidateError::Configuration(format!("'{key}' must not be empty")).into());
        }
        if self.glossary_table == self.summary_table {
            return Err(ConsolidateError::Configuration(
                "'glossary_table' and 'summary_table' must name different tables".to_string(),
            )
            .into());
        }
        Ok(())
    }

    pub fn summary_layout(&self) -> SummaryLayout {
        SummaryLayout {
            header_row: self.header_row,
            period_row: self.reporting_period_cell.row,
            period_column: self.reporting_period_cell.column,
            source_column: self.source_column.clone(),
            period_label_column: self.reporting_period_column.clone(),
        }
    }
}
