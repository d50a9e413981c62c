use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use xlsx_consolidate::category::{ORG_CHART, SCHEDULE_MATRIX};
use xlsx_consolidate::config::ConsolidateConfig;
use xlsx_consolidate::data::Value;
use xlsx_consolidate::frame::{Frame, Row};
use xlsx_consolidate::pipeline::{PipelineSettings, consolidate};
use xlsx_consolidate::schema::{self, CanonicalSchema, ReferenceSheet};
use xlsx_consolidate::workbook::MemoryWorkbook;

const HEADER_ROW: usize = 4;

fn schedule_columns() -> Vec<String> {
    let mut columns = SCHEDULE_MATRIX.sorted_columns();
    columns.push("Comments".to_string());
    columns
}

fn org_columns() -> Vec<String> {
    let mut columns = ORG_CHART.sorted_columns();
    columns.push("Title".to_string());
    columns
}

fn finance_columns() -> Vec<String> {
    (0..12).map(|i| format!("Metric {i}")).collect()
}

fn build_schema() -> CanonicalSchema {
    let mut rows: Vec<Row> = Vec::new();
    let tables = [
        ("Projects", schedule_columns()),
        ("People", org_columns()),
        ("Finance", finance_columns()),
        ("AssessmentSummary", vec!["Metric".to_string(), "Score".to_string()]),
    ];
    for (table, columns) in tables {
        for column in columns {
            rows.push(vec![Some(Value::from(table)), Some(Value::String(column))]);
        }
    }
    let sheet = ReferenceSheet {
        name: "Columns".to_string(),
        frame: Frame::with_rows(vec!["Table".into(), "Column".into()], rows),
    };
    schema::build(&[sheet]).expect("build schema").0
}

fn table(columns: Vec<String>, rows: usize, seed: usize) -> Frame {
    let mut columns = columns;
    // Physical order differs from canonical order.
    columns.reverse();
    let width = columns.len();
    let rows = (0..rows)
        .map(|r| {
            (0..width)
                .map(|c| Some(Value::Integer((seed * 100_000 + r * width + c) as i64)))
                .collect()
        })
        .collect();
    Frame::with_rows(columns, rows)
}

fn generate_sources(count: usize, rows: usize) -> Vec<(String, MemoryWorkbook)> {
    (0..count)
        .map(|idx| {
            let id = format!("Entity{idx:03}");
            let mut summary_grid: Vec<Row> = vec![Vec::new(); HEADER_ROW];
            summary_grid[2] = vec![Some("Reporting Period".into()), Some("Q1 2024".into())];
            summary_grid.push(vec![Some("Metric".into()), Some("Score".into())]);
            summary_grid.extend((0..10).map(|m| {
                vec![Some(Value::String(format!("m{m}"))), Some(Value::Integer(m))]
            }));
            let book = MemoryWorkbook::new(format!("assessment_guide_{id}.xlsx"))
                .with_table("Projects", HEADER_ROW, &table(schedule_columns(), rows, idx))
                .with_table("People", HEADER_ROW, &table(org_columns(), rows / 4, idx))
                .with_table("Finance", HEADER_ROW, &table(finance_columns(), rows, idx))
                .with_sheet("AssessmentSummary", summary_grid);
            (id, book)
        })
        .collect()
}

fn bench_consolidate(c: &mut Criterion) {
    let schema = build_schema();
    let config = ConsolidateConfig::new("reference.xlsx".into(), "guides".into(), "master.xlsx".into());
    let settings = PipelineSettings::from_config(&config);
    let sources = generate_sources(24, 2_000);

    let mut group = c.benchmark_group("consolidate");
    group.sample_size(20);

    group.bench_function("in_memory_24_sources", |b| {
        b.iter_batched(
            || sources.clone(),
            |sources| {
                consolidate(&schema, sources.into_iter().map(Ok), &settings)
                    .expect("consolidate in-memory sources");
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_consolidate);
criterion_main!(benches);
