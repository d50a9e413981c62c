//! Alignment of one source table against its canonical column list.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::frame::Frame;

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

/// Collapses every run of whitespace (newlines included) to one space and trims.
pub fn normalize_header(name: &str) -> String {
    let pattern = WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
    pattern.replace_all(name, " ").trim().to_string()
}

/// Which table from which source an aligned table belongs to.
#[derive(Debug, Clone, Copy)]
pub struct TableIdentity<'a> {
    pub source: &'a str,
    pub table: &'a str,
}

/// A source table holding exactly the canonical columns in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub table: String,
    pub source: String,
    pub frame: Frame,
}

/// Canonical columns a source table did not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns {
    pub source: String,
    pub table: String,
    pub columns: Vec<String>,
}

/// Reconciles `raw` to `canonical`: headers are normalized, columns reordered,
/// and canonical columns absent from the source are filled with nulls.
pub fn align(
    raw: &Frame,
    canonical: &[String],
    identity: TableIdentity<'_>,
) -> (AlignedTable, Option<MissingColumns>) {
    let normalized = raw
        .columns
        .iter()
        .map(|c| normalize_header(c))
        .collect::<Vec<_>>();
    let positions = canonical
        .iter()
        .map(|name| {
            let wanted = normalize_header(name);
            normalized.iter().position(|c| *c == wanted)
        })
        .collect::<Vec<_>>();

    let missing = canonical
        .iter()
        .zip(&positions)
        .filter(|(_, pos)| pos.is_none())
        .map(|(name, _)| name.clone())
        .collect::<Vec<_>>();

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            positions
                .iter()
                .map(|pos| pos.and_then(|idx| row.get(idx).cloned().flatten()))
                .collect()
        })
        .collect();

    let aligned = AlignedTable {
        table: identity.table.to_string(),
        source: identity.source.to_string(),
        frame: Frame {
            columns: canonical.to_vec(),
            rows,
        },
    };

    let report = if missing.is_empty() {
        None
    } else {
        warn!(
            "In table '{}' from source '{}', missing columns: {:?}",
            identity.table, identity.source, missing
        );
        Some(MissingColumns {
            source: identity.source.to_string(),
            table: identity.table.to_string(),
            columns: missing,
        })
    };
    (aligned, report)
}
