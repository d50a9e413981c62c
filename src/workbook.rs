//! Workbook I/O: reading source and reference documents, discovering sources,
//! and writing the consolidated master workbook.
//!
//! All physical spreadsheet access flows through this module. It provides:
//!
//! - **[`SheetSource`]**: the reader seam used by the pipeline. Implementors
//!   supply a dense cell grid per sheet; tabular reads with a header offset and
//!   raw positional cell reads are derived from that grid.
//! - **[`XlsxWorkbook`]**: calamine-backed reader for xlsx/xlsm/xls/xlsb/ods.
//! - **[`MemoryWorkbook`]**: grid-backed reader for tests and tooling.
//! - **Discovery**: glob-based source listing with deterministic ordering and
//!   source identifier derivation from file names.
//! - **Writing**: rust_xlsxwriter-backed export of named sheets.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use log::debug;
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    data::{Value, parse_naive_datetime},
    error::ConsolidateError,
    frame::{Frame, Row},
};

/// Reader seam for one workbook.
pub trait SheetSource {
    /// Human-readable document name used in diagnostics.
    fn document(&self) -> &Path;

    fn sheet_names(&self) -> Vec<String>;

    /// Returns every cell of `sheet` addressed by absolute zero-based position.
    /// Rows may have different lengths; absent cells are null.
    fn read_grid(&mut self, sheet: &str) -> Result<Vec<Row>>;

    /// Reads `sheet` treating row `header_row` as the header and every later
    /// non-blank row as data.
    fn read_tabular_sheet(&mut self, sheet: &str, header_row: usize) -> Result<Frame> {
        let grid = self.read_grid(sheet)?;
        Ok(frame_from_grid(grid, header_row))
    }

    /// Reads one cell without any header interpretation.
    fn read_raw_cell(&mut self, sheet: &str, row: usize, col: usize) -> Result<Option<Value>> {
        let grid = self
            .read_grid(sheet)
            .map_err(|err| match err.downcast::<ConsolidateError>() {
                Ok(ConsolidateError::Io {
                    document,
                    sheet,
                    message,
                    ..
                }) => ConsolidateError::Io {
                    document,
                    sheet,
                    cell: Some((row, col)),
                    message,
                }
                .into(),
                Ok(other) => other.into(),
                Err(err) => err,
            })?;
        Ok(grid
            .get(row)
            .and_then(|cells| cells.get(col))
            .cloned()
            .flatten())
    }
}

fn sheet_missing(document: &Path, sheet: &str) -> ConsolidateError {
    ConsolidateError::Io {
        document: document.to_path_buf(),
        sheet: sheet.to_string(),
        cell: None,
        message: "sheet not found".to_string(),
    }
}

pub struct XlsxWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl XlsxWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path).map_err(|err| ConsolidateError::Io {
            document: path.to_path_buf(),
            sheet: String::new(),
            cell: None,
            message: format!("cannot open workbook: {err}"),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }
}

impl SheetSource for XlsxWorkbook {
    fn document(&self) -> &Path {
        &self.path
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    fn read_grid(&mut self, sheet: &str) -> Result<Vec<Row>> {
        if !self.sheet_names().iter().any(|name| name == sheet) {
            return Err(sheet_missing(&self.path, sheet).into());
        }
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|err| ConsolidateError::Io {
                document: self.path.clone(),
                sheet: sheet.to_string(),
                cell: None,
                message: err.to_string(),
            })?;
        let Some((last_row, last_col)) = range.end() else {
            return Ok(Vec::new());
        };
        let mut grid = Vec::with_capacity(last_row as usize + 1);
        for row in 0..=last_row {
            let cells = (0..=last_col)
                .map(|col| range.get_value((row, col)).and_then(convert_cell))
                .collect::<Row>();
            grid.push(cells);
        }
        debug!(
            "Read {}x{} grid from {:?} sheet '{}'",
            grid.len(),
            last_col + 1,
            self.path,
            sheet
        );
        Ok(grid)
    }
}

fn convert_cell(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Value::from_text(s),
        Data::Int(i) => Some(Value::Integer(*i)),
        Data::Float(f) => Some(Value::Float(*f)),
        Data::Bool(b) => Some(Value::Boolean(*b)),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(parsed) => Value::DateTime(parsed),
            None => Value::Float(dt.as_f64()),
        }),
        Data::DateTimeIso(s) => match parse_naive_datetime(s) {
            Ok(parsed) => Some(Value::DateTime(parsed)),
            Err(_) => Value::from_text(s),
        },
        Data::DurationIso(s) => Value::from_text(s),
    }
}

/// In-memory workbook made of named cell grids.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    path: PathBuf,
    sheets: Vec<(String, Vec<Row>)>,
}

impl MemoryWorkbook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, name: &str, grid: Vec<Row>) -> Self {
        self.sheets.push((name.to_string(), grid));
        self
    }

    /// Adds a sheet whose header row sits at `header_row`, preceded by blank rows.
    pub fn with_table(self, name: &str, header_row: usize, frame: &Frame) -> Self {
        let mut grid: Vec<Row> = vec![Vec::new(); header_row];
        grid.push(
            frame
                .columns
                .iter()
                .map(|c| Some(Value::String(c.clone())))
                .collect(),
        );
        grid.extend(frame.rows.iter().cloned());
        self.with_sheet(name, grid)
    }
}

impl SheetSource for MemoryWorkbook {
    fn document(&self) -> &Path {
        &self.path
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_grid(&mut self, sheet: &str) -> Result<Vec<Row>> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| sheet_missing(&self.path, sheet).into())
    }
}

/// Builds a frame from a cell grid. Blank header cells become `Unnamed: <col>`,
/// repeated headers get `.1`, `.2`, ... suffixes, and fully blank data rows are
/// skipped. Columns with neither a header nor any data are not materialised.
pub fn frame_from_grid(grid: Vec<Row>, header_row: usize) -> Frame {
    if grid.len() <= header_row {
        return Frame::default();
    }
    let mut rows = grid.into_iter().skip(header_row);
    let header = rows.next().unwrap_or_default();
    let data = rows
        .filter(|row| row.iter().any(Option::is_some))
        .collect::<Vec<_>>();

    let width = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let keep = (0..width)
        .filter(|&col| {
            header.get(col).is_some_and(Option::is_some)
                || data.iter().any(|row| row.get(col).is_some_and(Option::is_some))
        })
        .collect::<Vec<_>>();

    let mut columns: Vec<String> = Vec::with_capacity(keep.len());
    for &col in &keep {
        let base = match header.get(col).cloned().flatten() {
            Some(value) => value.as_display(),
            None => format!("Unnamed: {col}"),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while columns.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        columns.push(name);
    }

    let rows = data
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&col| row.get(col).cloned().flatten())
                .collect()
        })
        .collect();
    Frame { columns, rows }
}

/// One discovered source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub identifier: String,
}

/// Extracts the substring following `marker` in the file's base name.
pub fn derive_source_identifier(path: &Path, marker: &str) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match stem.split_once(marker) {
        Some((_, identifier)) if !identifier.is_empty() => Ok(identifier.to_string()),
        _ => Err(ConsolidateError::SourceIdentifier {
            file: path.to_path_buf(),
            marker: marker.to_string(),
        }
        .into()),
    }
}

/// Lists documents in `folder` matching `pattern`, sorted by source identifier
/// and then path. Office lock files (`~$...`) are ignored.
pub fn list_source_documents(
    folder: &Path,
    pattern: &str,
    marker: &str,
) -> Result<Vec<SourceDocument>> {
    if !folder.is_dir() {
        return Err(ConsolidateError::Configuration(format!(
            "source folder {folder:?} does not exist or is not a directory"
        ))
        .into());
    }
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&folder.to_string_lossy()),
        pattern
    );
    let mut documents = Vec::new();
    for entry in glob::glob(&full_pattern)
        .map_err(|err| ConsolidateError::Configuration(format!("invalid source pattern: {err}")))?
    {
        let path = entry.with_context(|| format!("Listing {folder:?}"))?;
        let is_lock_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("~$"));
        if !path.is_file() || is_lock_file {
            continue;
        }
        let identifier = derive_source_identifier(&path, marker)?;
        documents.push(SourceDocument { path, identifier });
    }
    documents.sort_by(|a, b| {
        a.identifier
            .cmp(&b.identifier)
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(documents)
}

/// Writes each `(sheet name, frame)` pair as one worksheet, in order.
pub fn write_named_sheets(path: &Path, sheets: &[(&str, &Frame)]) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (name, frame) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(*name)
            .with_context(|| format!("Naming worksheet '{name}'"))?;
        for (col, header) in frame.columns.iter().enumerate() {
            let col = u16::try_from(col)
                .with_context(|| format!("Sheet '{name}' has too many columns"))?;
            worksheet
                .write_string_with_format(0, col, header, &header_format)
                .with_context(|| format!("Writing header '{header}' to sheet '{name}'"))?;
        }
        for (row_idx, row) in frame.rows.iter().enumerate() {
            let row_num = u32::try_from(row_idx + 1)
                .with_context(|| format!("Sheet '{name}' has too many rows"))?;
            for (col, cell) in row.iter().enumerate() {
                let Some(value) = cell else {
                    continue;
                };
                let col = u16::try_from(col)
                    .with_context(|| format!("Sheet '{name}' has too many columns"))?;
                let written = match value {
                    Value::String(s) => worksheet.write_string(row_num, col, s),
                    Value::Integer(i) => worksheet.write_number(row_num, col, *i as f64),
                    Value::Float(f) => worksheet.write_number(row_num, col, *f),
                    Value::Boolean(b) => worksheet.write_boolean(row_num, col, *b),
                    Value::DateTime(dt) => {
                        worksheet.write_datetime_with_format(row_num, col, dt, &datetime_format)
                    }
                };
                written.with_context(|| {
                    format!("Writing row {} column {} to sheet '{name}'", row_idx + 2, col + 1)
                })?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))?;
    Ok(())
}
