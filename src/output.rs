//! Assembly of the final named sheet bundle.

use std::path::Path;

use anyhow::Result;
use log::info;

use crate::{frame::Frame, merge::MergedPools, workbook};

pub const MAIN_SHEET: &str = "Sheet1";
pub const GLOSSARY_SHEET: &str = "Glossary";
pub const ORG_CHART_SHEET: &str = "OrgChart";
pub const SCHEDULE_MATRIX_SHEET: &str = "ScheduleMatrix";
pub const SUMMARY_SHEET: &str = "AssessmentSummary";

/// Named output sheets, in write order.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterOutput {
    sheets: Vec<(&'static str, Frame)>,
}

impl MasterOutput {
    pub fn assemble(pools: MergedPools) -> Self {
        let output = Self {
            sheets: vec![
                (MAIN_SHEET, pools.main),
                (GLOSSARY_SHEET, pools.glossary),
                (ORG_CHART_SHEET, pools.org_chart),
                (SCHEDULE_MATRIX_SHEET, pools.schedule_matrix),
                (SUMMARY_SHEET, pools.summary),
            ],
        };
        let (rows, columns) = output.main_shape();
        info!("Final master shape: ({rows}, {columns})");
        output
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&'static str, &Frame)> {
        self.sheets.iter().map(|(name, frame)| (*name, frame))
    }

    pub fn sheet(&self, name: &str) -> Option<&Frame> {
        self.sheets
            .iter()
            .find(|(sheet, _)| *sheet == name)
            .map(|(_, frame)| frame)
    }

    /// Row and column counts of the Main sheet.
    pub fn main_shape(&self) -> (usize, usize) {
        self.sheet(MAIN_SHEET)
            .map(|frame| (frame.height(), frame.width()))
            .unwrap_or((0, 0))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let sheets = self.sheets().collect::<Vec<_>>();
        workbook::write_named_sheets(path, &sheets)?;
        info!("Saved master sheet to {path:?}");
        Ok(())
    }
}
