use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use csv::{QuoteStyle, WriterBuilder};

use crate::models::Program;
use crate::report;

pub const SUPPORTED_FORMATS: &[&str] = &["csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Programs,
    Activities,
    Tasks,
    Analytics,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::Programs,
        ExportKind::Activities,
        ExportKind::Tasks,
        ExportKind::Analytics,
    ];

    fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Programs => "programs.csv",
            ExportKind::Activities => "activities.csv",
            ExportKind::Tasks => "tasks.csv",
            ExportKind::Analytics => "analytics.csv",
        }
    }
}

/// Outcome of an export request. An unrecognized format is a recognized
/// response listing what is supported, distinct from a hard error.
#[derive(Debug)]
pub enum ExportResponse {
    Completed(BTreeMap<String, String>),
    Unsupported {
        requested: String,
        supported: Vec<&'static str>,
    },
}

/// Flattens the requested record types into named delimited-text tables.
/// Every cell is quoted, with internal quotes doubled.
pub fn run_export(
    programs: &[Program],
    kinds: &[ExportKind],
    format: &str,
    today: NaiveDate,
) -> anyhow::Result<ExportResponse> {
    if !format.eq_ignore_ascii_case("csv") {
        return Ok(ExportResponse::Unsupported {
            requested: format.to_string(),
            supported: SUPPORTED_FORMATS.to_vec(),
        });
    }

    let mut tables = BTreeMap::new();
    for kind in ExportKind::ALL {
        if !kinds.contains(&kind) {
            continue;
        }
        let content = match kind {
            ExportKind::Programs => program_table(programs)?,
            ExportKind::Activities => activity_table(programs)?,
            ExportKind::Tasks => task_table(programs)?,
            ExportKind::Analytics => analytics_table(programs, today)?,
        };
        tables.insert(kind.file_name().to_string(), content);
    }

    Ok(ExportResponse::Completed(tables))
}

fn write_table(header: &[&str], rows: Vec<Vec<String>>) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn opt_string(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn program_table(programs: &[Program]) -> anyhow::Result<String> {
    let header = [
        "Program ID",
        "Name",
        "Focus Area",
        "Year",
        "Status",
        "Total Budget",
        "Location",
        "Beneficiaries Reached",
    ];

    let rows = programs
        .iter()
        .map(|program| {
            vec![
                program.id.to_string(),
                program.name.clone(),
                program.focus_area.label().to_string(),
                program.year.to_string(),
                program.status.clone(),
                program.budget_total.to_string(),
                program.location.clone(),
                program
                    .beneficiaries_reached
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    write_table(&header, rows)
}

fn activity_table(programs: &[Program]) -> anyhow::Result<String> {
    let header = [
        "Activity ID",
        "Program",
        "Name",
        "Budget Allocated",
        "Budget Utilized",
        "Progress Notes",
    ];

    let mut rows = Vec::new();
    for program in programs {
        for activity in &program.activities {
            rows.push(vec![
                activity.id.to_string(),
                program.name.clone(),
                activity.name.clone(),
                activity.budget_allocated.to_string(),
                activity
                    .budget_utilized
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                opt_string(&activity.progress_notes),
            ]);
        }
    }

    write_table(&header, rows)
}

fn task_table(programs: &[Program]) -> anyhow::Result<String> {
    let header = [
        "Task ID",
        "Program",
        "Activity",
        "Name",
        "Status Score",
        "Due Date",
        "Evaluation Criteria",
        "Risks",
        "Mitigations",
        "Notes",
    ];

    let mut rows = Vec::new();
    for program in programs {
        for activity in &program.activities {
            for task in &activity.tasks {
                rows.push(vec![
                    task.id.to_string(),
                    program.name.clone(),
                    activity.name.clone(),
                    task.name.clone(),
                    task.status_score.map(|s| s.to_string()).unwrap_or_default(),
                    task.due_date.map(|d| d.to_string()).unwrap_or_default(),
                    opt_string(&task.evaluation_criteria),
                    opt_string(&task.risks),
                    opt_string(&task.mitigations),
                    opt_string(&task.notes),
                ]);
            }
        }
    }

    write_table(&header, rows)
}

/// Flattens the analytics summary into section/metric/value rows so it can
/// ride along with the record tables.
fn analytics_table(programs: &[Program], today: NaiveDate) -> anyhow::Result<String> {
    let summary = report::build_summary(programs, today);
    let header = ["Section", "Metric", "Value"];
    let mut rows = Vec::new();

    let overview = &summary.overview;
    for (metric, value) in [
        ("Total Programs", overview.total_programs.to_string()),
        ("Overall Completion %", overview.overall_completion.to_string()),
        ("Budget Utilization %", overview.budget_utilization.to_string()),
        ("Total Beneficiaries", overview.total_beneficiaries.to_string()),
    ] {
        rows.push(vec!["Overview".to_string(), metric.to_string(), value]);
    }

    let buckets = &summary.task_performance;
    for (metric, count) in [
        ("Completed", buckets.completed),
        ("On Track", buckets.on_track),
        ("Behind", buckets.behind),
        ("At Risk", buckets.at_risk),
    ] {
        rows.push(vec![
            "Task Performance".to_string(),
            metric.to_string(),
            count.to_string(),
        ]);
    }

    for row in &summary.focus_area_performance {
        for (metric, value) in [
            ("Completion Rate %", row.completion_rate),
            ("Budget Utilization %", row.budget_utilization),
            ("Task Success %", row.task_success),
        ] {
            rows.push(vec![
                row.area.label().to_string(),
                metric.to_string(),
                value.to_string(),
            ]);
        }
    }

    write_table(&header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, FocusArea, Task};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn sample_program(name: &str, location: &str) -> Program {
        let id = Uuid::new_v4();
        Program {
            id,
            name: name.to_string(),
            focus_area: FocusArea::SurvivorEmpowerment,
            year: 2026,
            status: "active".to_string(),
            budget_total: 50_000.0,
            location: location.to_string(),
            beneficiaries_reached: None,
            activities: vec![Activity {
                id: Uuid::new_v4(),
                program_id: id,
                name: "Vocational training".to_string(),
                budget_allocated: 20_000.0,
                budget_utilized: Some(12_500.0),
                progress_notes: None,
                tasks: vec![Task {
                    id: Uuid::new_v4(),
                    activity_id: Uuid::new_v4(),
                    name: "Enroll cohort".to_string(),
                    status_score: Some(8),
                    due_date: None,
                    evaluation_criteria: None,
                    risks: None,
                    mitigations: None,
                    notes: None,
                }],
            }],
        }
    }

    #[test]
    fn unsupported_format_lists_csv_and_writes_nothing() {
        let response = run_export(&[], &ExportKind::ALL, "xlsx", today()).unwrap();
        match response {
            ExportResponse::Unsupported { requested, supported } => {
                assert_eq!(requested, "xlsx");
                assert_eq!(supported, vec!["csv"]);
            }
            ExportResponse::Completed(_) => panic!("xlsx must not be exported"),
        }
    }

    #[test]
    fn export_produces_one_table_per_requested_kind() {
        let programs = vec![sample_program("Safe Shelter Network", "Kisumu")];
        let response = run_export(&programs, &ExportKind::ALL, "csv", today()).unwrap();
        let ExportResponse::Completed(tables) = response else {
            panic!("csv export must complete");
        };
        let names: Vec<&str> = tables.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["activities.csv", "analytics.csv", "programs.csv", "tasks.csv"]
        );
    }

    #[test]
    fn every_cell_is_quoted() {
        let programs = vec![sample_program("Safe Shelter Network", "Kisumu")];
        let response = run_export(&programs, &[ExportKind::Programs], "csv", today()).unwrap();
        let ExportResponse::Completed(tables) = response else {
            panic!("csv export must complete");
        };
        let content = &tables["programs.csv"];
        for line in content.lines() {
            assert!(line.starts_with('"') && line.ends_with('"'), "line: {line}");
        }
    }

    #[test]
    fn round_trip_preserves_commas_and_quotes() {
        let mut tricky = sample_program("Outreach, phase \"two\"", "Nairobi, Westlands");
        tricky.status = "on \"hold\"".to_string();
        let plain = sample_program("Safe Shelter Network", "Kisumu");
        let programs = vec![tricky, plain];

        let response = run_export(&programs, &[ExportKind::Programs], "csv", today()).unwrap();
        let ExportResponse::Completed(tables) = response else {
            panic!("csv export must complete");
        };

        let mut reader = csv::Reader::from_reader(tables["programs.csv"].as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), programs.len());
        for (record, program) in records.iter().zip(&programs) {
            assert_eq!(&record[1], program.name.as_str());
            assert_eq!(&record[4], program.status.as_str());
            assert_eq!(&record[6], program.location.as_str());
        }
    }

    #[test]
    fn null_fields_export_as_empty_cells() {
        let mut program = sample_program("Safe Shelter Network", "Kisumu");
        program.activities[0].budget_utilized = None;
        program.activities[0].tasks[0].status_score = None;

        let response = run_export(
            &[program],
            &[ExportKind::Activities, ExportKind::Tasks],
            "csv",
            today(),
        )
        .unwrap();
        let ExportResponse::Completed(tables) = response else {
            panic!("csv export must complete");
        };

        let mut activities = csv::Reader::from_reader(tables["activities.csv"].as_bytes());
        let record = activities.records().next().unwrap().unwrap();
        assert_eq!(&record[4], "");

        let mut tasks = csv::Reader::from_reader(tables["tasks.csv"].as_bytes());
        let record = tasks.records().next().unwrap().unwrap();
        assert_eq!(&record[4], "");
    }

    #[test]
    fn analytics_table_reports_the_shared_calculators() {
        let programs = vec![sample_program("Safe Shelter Network", "Kisumu")];
        let response = run_export(&programs, &[ExportKind::Analytics], "csv", today()).unwrap();
        let ExportResponse::Completed(tables) = response else {
            panic!("csv export must complete");
        };

        let mut reader = csv::Reader::from_reader(tables["analytics.csv"].as_bytes());
        let rows: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        let utilization = rows
            .iter()
            .find(|r| &r[0] == "Overview" && &r[1] == "Budget Utilization %")
            .unwrap();
        assert_eq!(&utilization[2], "25");
        // 4 overview + 4 bucket + 4 areas * 3 metrics
        assert_eq!(rows.len(), 20);
    }
}
