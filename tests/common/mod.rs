#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

use xlsx_consolidate::data::Value;
use xlsx_consolidate::frame::Row;

pub const HEADER_ROW: usize = 4;

pub const SCHEDULE_COLUMNS: [&str; 9] = [
    "ProjectID",
    "ForecastCompletionYear",
    "ProjectType",
    "ProjectStage",
    "Criticality",
    "DelayInSchedule",
    "CostOverrun",
    "Priority",
    "ProjectValue",
];

pub const ORG_COLUMNS: [&str; 5] = ["EmployeeID", "ManagerID", "Label", "Group", "Sub-Label"];

pub fn text(value: &str) -> Option<Value> {
    Some(Value::String(value.to_string()))
}

pub fn int(value: i64) -> Option<Value> {
    Some(Value::Integer(value))
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Writes an xlsx workbook where each sheet is a grid of absolute cells.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, Vec<Row>)]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        let mut workbook = Workbook::new();
        for (sheet_name, grid) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*sheet_name).expect("sheet name");
            for (r, row) in grid.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32, c as u16);
                    match cell {
                        None => {}
                        Some(Value::String(s)) => {
                            worksheet.write_string(r, c, s).expect("write string");
                        }
                        Some(Value::Integer(i)) => {
                            worksheet.write_number(r, c, *i as f64).expect("write int");
                        }
                        Some(Value::Float(f)) => {
                            worksheet.write_number(r, c, *f).expect("write float");
                        }
                        Some(Value::Boolean(b)) => {
                            worksheet.write_boolean(r, c, *b).expect("write bool");
                        }
                        Some(Value::DateTime(_)) => panic!("datetime fixtures are not used"),
                    }
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// A sheet with `HEADER_ROW` preamble rows followed by the header and data.
pub fn table_grid(headers: &[&str], rows: Vec<Row>) -> Vec<Row> {
    let mut grid: Vec<Row> = vec![vec![text("Assessment Guide")], vec![], vec![], vec![]];
    grid.push(headers.iter().map(|h| text(h)).collect());
    grid.extend(rows);
    grid
}

pub fn reference_sheets() -> Vec<(&'static str, Vec<Row>)> {
    let mut pairs: Vec<(&str, &str)> = SCHEDULE_COLUMNS.iter().map(|c| ("Projects", *c)).collect();
    pairs.push(("Projects", "Comments"));
    pairs.extend(ORG_COLUMNS.iter().map(|c| ("People", *c)));
    pairs.push(("People", "Title"));
    pairs.extend([
        ("Finance", "Budget"),
        ("Finance", "Spend"),
        ("Finance", "Budget"),
        ("AssessmentSummary", "Metric"),
        ("AssessmentSummary", "Score"),
        ("Glossary&Definitions", "Term"),
        ("Glossary&Definitions", "Definition"),
    ]);

    let mut columns: Vec<Row> = vec![vec![text("Table"), text("Column")]];
    columns.extend(pairs.into_iter().map(|(t, c)| vec![text(t), text(c)]));
    let notes = vec![vec![text("Comment")], vec![text("Maintained by the PMO")]];
    vec![("Columns", columns), ("Notes", notes)]
}

/// Sheets for one source. Headers are deliberately shuffled and whitespace-noisy.
pub fn source_sheets(project_ids: &[i64], period: &str) -> Vec<(&'static str, Vec<Row>)> {
    let mut project_headers = vec!["Comments"];
    project_headers.extend(SCHEDULE_COLUMNS.iter().rev());
    let project_headers = project_headers
        .into_iter()
        .map(|h| if h == "ForecastCompletionYear" { " ForecastCompletionYear\n" } else { h })
        .collect::<Vec<_>>();
    let project_rows = project_ids
        .iter()
        .map(|id| {
            let mut row = vec![text(&format!("note {id}"))];
            for column in SCHEDULE_COLUMNS.iter().rev() {
                row.push(if *column == "ProjectID" { int(*id) } else { text(column) });
            }
            row
        })
        .collect();

    let people = table_grid(
        &["Title", "EmployeeID", "ManagerID", "Label", "Group", "Sub-Label"],
        vec![
            vec![text("Lead"), int(1), None, text("CEO"), text("Exec"), text("Board")],
            vec![text("Temp"), None, int(1), text("Vacant"), text("Ops"), text("Field")],
        ],
    );

    let finance = table_grid(&["Spend"], vec![vec![int(10)], vec![int(20)], vec![int(30)]]);

    let mut summary = vec![
        vec![text("Assessment Summary")],
        vec![],
        vec![text("Reporting Period"), text(period)],
        vec![],
        vec![text("Metric"), text("Score")],
    ];
    summary.push(vec![text("Safety"), int(4)]);
    summary.push(vec![text("Quality"), None]);

    let glossary = table_grid(
        &["Term", "Definition"],
        vec![vec![text("FCY"), text("Forecast completion year")]],
    );

    vec![
        ("Projects", table_grid(&project_headers, project_rows)),
        ("People", people),
        ("Finance", finance),
        ("AssessmentSummary", summary),
        ("Glossary&Definitions", glossary),
    ]
}

/// Creates reference, two sources and a config file. Returns the config path.
pub fn standard_project(workspace: &TestWorkspace) -> PathBuf {
    workspace.write_workbook("reference.xlsx", &reference_sheets());
    workspace.write_workbook(
        "guides/assessment_guide_Beta.xlsx",
        &source_sheets(&[3, 4], "Q2 2024"),
    );
    workspace.write_workbook(
        "guides/assessment_guide_Alpha.xlsx",
        &source_sheets(&[1, 2], "Q1 2024"),
    );
    workspace.write(
        "config.yaml",
        "column_reference_file_name: reference.xlsx\n\
         assessment_guide_folder_name: guides\n\
         compiled_master_sheet: master.xlsx\n",
    )
}

/// Reads every cell of `sheet` from an xlsx file as display strings.
pub fn read_sheet(path: &Path, sheet: &str) -> Vec<Vec<String>> {
    let mut workbook = open_workbook_auto(path).expect("open output workbook");
    let range = workbook.worksheet_range(sheet).expect("sheet exists");
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    let workbook = open_workbook_auto(path).expect("open output workbook");
    workbook.sheet_names().to_vec()
}
