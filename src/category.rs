//! Column-set routing of aligned tables into output categories.
//!
//! A table belongs to a category when its aligned column set is a superset of
//! the category's [`CategoryColumnSet`]. Matching is checked in a fixed order:
//! OrgChart first, then ScheduleMatrix; anything else stays in the Main pool.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{align::AlignedTable, data::Value, frame::Frame};

/// A named, fixed set of column names defining a routable category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryColumnSet {
    pub name: &'static str,
    columns: &'static [&'static str],
}

pub const ORG_CHART: CategoryColumnSet = CategoryColumnSet {
    name: "OrgChart",
    columns: &["EmployeeID", "ManagerID", "Label", "Group", "Sub-Label"],
};

pub const SCHEDULE_MATRIX: CategoryColumnSet = CategoryColumnSet {
    name: "ScheduleMatrix",
    columns: &[
        "ProjectID",
        "ForecastCompletionYear",
        "ProjectType",
        "ProjectStage",
        "Criticality",
        "DelayInSchedule",
        "CostOverrun",
        "Priority",
        "ProjectValue",
    ],
};

impl CategoryColumnSet {
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// True when every category column appears in `columns`.
    pub fn is_subset_of<S: AsRef<str>>(&self, columns: &[S]) -> bool {
        self.columns
            .iter()
            .all(|wanted| columns.iter().any(|c| c.as_ref() == *wanted))
    }

    /// Category columns in alphabetical order, the order they are emitted in.
    pub fn sorted_columns(&self) -> Vec<String> {
        let mut sorted = self.columns.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        sorted.sort();
        sorted
    }
}

/// What happens to the non-category columns of a table routed to OrgChart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgChartRemainder {
    /// The table contributes nothing to the Main pool.
    #[default]
    Discard,
    /// Columns outside both category sets go to the Main pool.
    Keep,
}

/// Contributions of one aligned table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routed {
    pub main: Option<Frame>,
    pub org_chart: Option<Frame>,
    pub schedule_matrix: Option<Frame>,
}

#[derive(Debug, Clone)]
pub struct CategoryRouter {
    source_column: String,
    org_chart_remainder: OrgChartRemainder,
}

impl CategoryRouter {
    pub fn new(source_column: &str, org_chart_remainder: OrgChartRemainder) -> Self {
        Self {
            source_column: source_column.to_string(),
            org_chart_remainder,
        }
    }

    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    /// Routes one aligned table. OrgChart takes precedence: a table carrying both
    /// category sets contributes nothing to ScheduleMatrix.
    pub fn classify(&self, aligned: &AlignedTable) -> Result<Routed> {
        let frame = &aligned.frame;
        if ORG_CHART.is_subset_of(&frame.columns) {
            if SCHEDULE_MATRIX.is_subset_of(&frame.columns) {
                warn!(
                    "Table '{}' from '{}' carries both {} and {} columns; routed to {} only, {} columns dropped",
                    aligned.table,
                    aligned.source,
                    ORG_CHART.name,
                    SCHEDULE_MATRIX.name,
                    ORG_CHART.name,
                    SCHEDULE_MATRIX.name
                );
            }
            debug!(
                "Table '{}' from '{}' routed to {}",
                aligned.table, aligned.source, ORG_CHART.name
            );
            let main = match self.org_chart_remainder {
                OrgChartRemainder::Discard => None,
                OrgChartRemainder::Keep => Some(without_categories(frame)),
            };
            return Ok(Routed {
                main,
                org_chart: Some(self.extract(aligned, &ORG_CHART)?),
                schedule_matrix: None,
            });
        }
        if SCHEDULE_MATRIX.is_subset_of(&frame.columns) {
            debug!(
                "Table '{}' from '{}' routed to {}",
                aligned.table, aligned.source, SCHEDULE_MATRIX.name
            );
            return Ok(Routed {
                main: Some(frame.retain_columns(|c| !SCHEDULE_MATRIX.contains(c))),
                org_chart: None,
                schedule_matrix: Some(self.extract(aligned, &SCHEDULE_MATRIX)?),
            });
        }
        Ok(Routed {
            main: Some(without_categories(frame)),
            ..Routed::default()
        })
    }

    fn extract(&self, aligned: &AlignedTable, category: &CategoryColumnSet) -> Result<Frame> {
        let mut extracted = aligned
            .frame
            .select(&category.sorted_columns())
            .with_context(|| {
                format!(
                    "Extracting {} columns from table '{}' of source '{}'",
                    category.name, aligned.table, aligned.source
                )
            })?;
        extracted.insert_constant(
            0,
            &self.source_column,
            Some(Value::String(aligned.source.clone())),
        );
        Ok(extracted)
    }

    /// Joins one source's Main contributions column-wise and prepends the
    /// source identifier column.
    pub fn combine_main(&self, source: &str, pieces: Vec<Frame>) -> Frame {
        let mut combined = Frame::hconcat(pieces);
        combined.insert_constant(0, &self.source_column, Some(Value::String(source.to_string())));
        combined
    }

    /// Header of an empty pool for `category`.
    pub fn empty_pool(&self, category: &CategoryColumnSet) -> Frame {
        let mut columns = vec![self.source_column.clone()];
        columns.extend(category.sorted_columns());
        Frame::new(columns)
    }
}

fn without_categories(frame: &Frame) -> Frame {
    frame.retain_columns(|c| !ORG_CHART.contains(c) && !SCHEDULE_MATRIX.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(columns: &[&str], rows: usize) -> AlignedTable {
        let columns = columns.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let width = columns.len();
        let rows = (0..rows)
            .map(|r| (0..width).map(|c| Some(Value::Integer((r * 100 + c) as i64))).collect())
            .collect();
        AlignedTable {
            table: "Sheet".to_string(),
            source: "Alpha".to_string(),
            frame: Frame::with_rows(columns, rows),
        }
    }

    fn router() -> CategoryRouter {
        CategoryRouter::new("DevCo", OrgChartRemainder::Discard)
    }

    #[test]
    fn superset_test_requires_every_category_column() {
        assert!(ORG_CHART.is_subset_of(&[
            "Label", "Group", "EmployeeID", "Sub-Label", "ManagerID", "Extra"
        ]));
        assert!(!ORG_CHART.is_subset_of(&["Label", "Group", "EmployeeID", "ManagerID"]));
    }

    #[test]
    fn org_chart_tables_emit_sorted_columns_and_no_main() {
        let table = aligned(
            &["Sub-Label", "ManagerID", "Notes", "Label", "Group", "EmployeeID"],
            2,
        );
        let routed = router().classify(&table).unwrap();
        assert!(routed.main.is_none());
        assert!(routed.schedule_matrix.is_none());
        let org = routed.org_chart.expect("org chart contribution");
        assert_eq!(
            org.columns,
            ["DevCo", "EmployeeID", "Group", "Label", "ManagerID", "Sub-Label"]
        );
        assert!(org.rows.iter().all(|row| row[0] == Some("Alpha".into())));
        // EmployeeID sat at physical index 5
        assert_eq!(org.rows[1][1], Some(Value::Integer(105)));
    }

    #[test]
    fn org_chart_remainder_can_be_kept() {
        let table = aligned(
            &["EmployeeID", "ManagerID", "Label", "Group", "Sub-Label", "Notes"],
            1,
        );
        let routed = CategoryRouter::new("DevCo", OrgChartRemainder::Keep)
            .classify(&table)
            .unwrap();
        assert_eq!(routed.main.expect("main").columns, ["Notes"]);
    }

    #[test]
    fn schedule_matrix_tables_keep_their_remainder() {
        let mut columns = SCHEDULE_MATRIX.columns.to_vec();
        columns.push("Comments");
        let routed = router().classify(&aligned(&columns, 3)).unwrap();
        assert_eq!(routed.main.expect("main").columns, ["Comments"]);
        let schedule = routed.schedule_matrix.expect("schedule contribution");
        assert_eq!(schedule.columns[0], "DevCo");
        assert_eq!(schedule.columns[1..], SCHEDULE_MATRIX.sorted_columns()[..]);
        assert_eq!(schedule.height(), 3);
    }

    #[test]
    fn generic_tables_drop_stray_category_columns() {
        let routed = router()
            .classify(&aligned(&["ProjectID", "Budget", "Label"], 1))
            .unwrap();
        assert!(routed.org_chart.is_none());
        assert!(routed.schedule_matrix.is_none());
        assert_eq!(routed.main.expect("main").columns, ["Budget"]);
    }

    #[test]
    fn org_chart_wins_when_both_category_sets_match() {
        let mut columns = ORG_CHART.columns.to_vec();
        columns.extend(SCHEDULE_MATRIX.columns);
        columns.push("Notes");
        let table = aligned(&columns, 2);

        for remainder in [OrgChartRemainder::Discard, OrgChartRemainder::Keep] {
            let routed = CategoryRouter::new("DevCo", remainder).classify(&table).unwrap();
            assert!(routed.schedule_matrix.is_none());
            let org = routed.org_chart.expect("org chart contribution");
            assert_eq!(org.columns[1..], ORG_CHART.sorted_columns()[..]);
            assert_eq!(org.height(), 2);
            match remainder {
                OrgChartRemainder::Discard => assert!(routed.main.is_none()),
                OrgChartRemainder::Keep => {
                    assert_eq!(routed.main.expect("main").columns, ["Notes"]);
                }
            }
        }
    }

    #[test]
    fn combine_main_prepends_source_column() {
        let a = Frame::with_rows(
            vec!["A".into()],
            vec![vec![Some(Value::Integer(1))], vec![Some(Value::Integer(2))]],
        );
        let b = Frame::with_rows(vec!["B".into()], vec![vec![Some(Value::Integer(3))]]);
        let combined = router().combine_main("Beta", vec![a, b]);
        assert_eq!(combined.columns, ["DevCo", "A", "B"]);
        assert_eq!(combined.height(), 2);
        assert_eq!(
            combined.rows[1],
            vec![Some("Beta".into()), Some(Value::Integer(2)), None]
        );
    }
}
