//! Canonical schema registry.
//!
//! The reference workbook declares, on one or more sheets, rows of
//! `Table`/`Column` pairs. [`build`] merges those declarations into a
//! [`CanonicalSchema`]: table name to an ordered, duplicate-free column list.
//!
//! ## Rules
//!
//! - A sheet qualifies only when it has both a `Table` and a `Column` header;
//!   other sheets are skipped and recorded in the [`SchemaReport`].
//! - Lists for the same table are concatenated across sheets in sheet order,
//!   then deduplicated keeping the first occurrence.
//! - Tables are ordered by first appearance in the reference rows.
//! - Rows with a null `Table` or `Column` value are ignored.
//! - Column names are whitespace-normalized before grouping, so `"A"` and
//!   `"A\n"` are the same column.

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};

use crate::{
    align::normalize_header,
    error::ConsolidateError,
    frame::Frame,
    workbook::{SheetSource, XlsxWorkbook},
};

pub const TABLE_FIELD: &str = "Table";
pub const COLUMN_FIELD: &str = "Column";

/// One sheet of the reference workbook, read with its first row as header.
#[derive(Debug, Clone)]
pub struct ReferenceSheet {
    pub name: String,
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Immutable mapping of table name to canonical column list, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalSchema {
    tables: Vec<TableSchema>,
}

impl CanonicalSchema {
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.table(table).map(|t| t.columns.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateColumns {
    pub table: String,
    pub columns: Vec<String>,
}

/// Non-fatal findings collected while building the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub skipped_sheets: Vec<String>,
    pub duplicates: Vec<DuplicateColumns>,
}

/// Reads every sheet of the reference workbook in workbook order.
pub fn enumerate_reference_rows(source: &mut dyn SheetSource) -> Result<Vec<ReferenceSheet>> {
    source
        .sheet_names()
        .into_iter()
        .map(|name| {
            let frame = source
                .read_tabular_sheet(&name, 0)
                .with_context(|| format!("Reading reference sheet '{name}'"))?;
            Ok(ReferenceSheet { name, frame })
        })
        .collect()
}

/// Opens the reference workbook at `path` and builds the canonical schema.
pub fn load(path: &Path) -> Result<(CanonicalSchema, SchemaReport)> {
    if !path.is_file() {
        return Err(ConsolidateError::Configuration(format!(
            "reference document {path:?} does not exist"
        ))
        .into());
    }
    let mut workbook = XlsxWorkbook::open(path).map_err(|err| {
        ConsolidateError::Configuration(format!("reference document {path:?} is unreadable: {err}"))
    })?;
    let sheets = enumerate_reference_rows(&mut workbook)?;
    build(&sheets).with_context(|| format!("Building canonical schema from {path:?}"))
}

pub fn build(sheets: &[ReferenceSheet]) -> Result<(CanonicalSchema, SchemaReport)> {
    let mut report = SchemaReport::default();
    let mut order: Vec<String> = Vec::new();
    let mut gathered: HashMap<String, Vec<String>> = HashMap::new();
    let mut qualifying = 0usize;

    for sheet in sheets {
        let (Some(table_idx), Some(column_idx)) = (
            sheet.frame.column_index(TABLE_FIELD),
            sheet.frame.column_index(COLUMN_FIELD),
        ) else {
            warn!(
                "Skipping reference sheet '{}': missing \"{TABLE_FIELD}\" and \"{COLUMN_FIELD}\" columns",
                sheet.name
            );
            report.skipped_sheets.push(sheet.name.clone());
            continue;
        };
        qualifying += 1;
        for row in &sheet.frame.rows {
            let (Some(table), Some(column)) = (&row[table_idx], &row[column_idx]) else {
                continue;
            };
            let table = table.as_display();
            let columns = gathered.entry(table.clone()).or_insert_with(|| {
                order.push(table);
                Vec::new()
            });
            columns.push(normalize_header(&column.as_display()));
        }
    }

    if qualifying == 0 {
        return Err(ConsolidateError::Schema(format!(
            "no reference sheet exposes both \"{TABLE_FIELD}\" and \"{COLUMN_FIELD}\" columns ({} sheet(s) skipped)",
            report.skipped_sheets.len()
        ))
        .into());
    }

    let mut tables = Vec::with_capacity(order.len());
    for name in order {
        let all_columns = gathered.remove(&name).unwrap_or_default();
        let counts = all_columns.iter().counts();
        let dupes = all_columns
            .iter()
            .unique()
            .filter(|col| counts.get(col).copied().unwrap_or(0) > 1)
            .cloned()
            .collect::<Vec<_>>();
        if dupes.is_empty() {
            info!("Table '{name}' has no repeated columns");
        } else {
            warn!("Table '{name}' has duplicate columns: {dupes:?}");
            report.duplicates.push(DuplicateColumns {
                table: name.clone(),
                columns: dupes,
            });
        }
        let columns = all_columns.into_iter().unique().collect();
        tables.push(TableSchema { name, columns });
    }

    if tables.is_empty() {
        warn!("Canonical schema is empty: reference sheets declare no tables");
    }
    Ok((CanonicalSchema { tables }, report))
}
