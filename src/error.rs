//! Error taxonomy for a consolidation run.
//!
//! Every variant here is fatal: the run aborts before any output is written.
//! Missing columns in a source table are not errors; they are reported through
//! [`crate::align::MissingColumns`] and recovered by null-filling.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// Unreadable or invalid configuration, reference path, or source folder.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reference document exists but cannot yield a canonical schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Contributions to one output category disagree on their column set.
    #[error(
        "cannot merge {category} contribution from source '{source_id}': expected columns {expected:?}, found {found:?}"
    )]
    Merge {
        category: String,
        source_id: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A document, sheet, or cell could not be read.
    #[error("failed to read {document:?} sheet '{sheet}'{}: {message}", cell_suffix(.cell))]
    Io {
        document: PathBuf,
        sheet: String,
        cell: Option<(usize, usize)>,
        message: String,
    },

    /// A source document name does not carry the identifier marker.
    #[error("cannot derive source identifier from {file:?}: marker '{marker}' not found")]
    SourceIdentifier { file: PathBuf, marker: String },
}

fn cell_suffix(cell: &Option<(usize, usize)>) -> String {
    match cell {
        Some((row, col)) => format!(" cell (row {row}, column {col})"),
        None => String::new(),
    }
}
