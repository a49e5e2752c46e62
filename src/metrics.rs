use chrono::NaiveDate;

use crate::classify;
use crate::models::{FocusArea, FocusAreaPerformance, Program, TaskPerformance};

/// round(100 * numerator / denominator), short-circuiting to 0 when the
/// denominator is 0 so empty or unbudgeted selections never divide by zero.
pub fn percentage(numerator: f64, denominator: f64) -> u32 {
    if denominator <= 0.0 {
        return 0;
    }
    (100.0 * numerator / denominator).round() as u32
}

fn budget_totals<'a>(programs: impl Iterator<Item = &'a Program>) -> (f64, f64) {
    let mut total = 0.0;
    let mut utilized = 0.0;
    for program in programs {
        total += program.budget_total;
        for activity in &program.activities {
            utilized += activity.budget_utilized.unwrap_or(0.0);
        }
    }
    (total, utilized)
}

/// Utilized budget over total budget across the selection, as a rounded
/// percentage. The summary reports this same number as both overall
/// completion and budget utilization.
pub fn utilization_rate(programs: &[Program]) -> u32 {
    let (total, utilized) = budget_totals(programs.iter());
    percentage(utilized, total)
}

/// Tallies every scored task across the selection into the performance
/// buckets. Buckets are not mutually exclusive: a behind task with a near
/// due date also counts as at risk.
pub fn bucket_tasks(programs: &[Program], today: NaiveDate) -> TaskPerformance {
    let mut buckets = TaskPerformance::default();

    let tasks = programs
        .iter()
        .flat_map(|program| &program.activities)
        .flat_map(|activity| &activity.tasks);

    for task in tasks {
        let Some(flags) = classify::classify_task(task, today) else {
            continue;
        };
        if flags.completed {
            buckets.completed += 1;
        }
        if flags.on_track {
            buckets.on_track += 1;
        }
        if flags.behind {
            buckets.behind += 1;
        }
        if flags.at_risk {
            buckets.at_risk += 1;
        }
    }

    buckets
}

/// One row per focus area, in declared order. Areas with no programs or no
/// tasks produce zero-valued rows rather than being omitted.
pub fn focus_area_rollup(programs: &[Program]) -> Vec<FocusAreaPerformance> {
    FocusArea::ALL
        .iter()
        .map(|&area| {
            let selected = programs.iter().filter(|p| p.focus_area == area);
            let (total_budget, utilized) = budget_totals(selected.clone());
            let rate = percentage(utilized, total_budget);

            let mut task_count = 0usize;
            let mut completed = 0usize;
            for activity in selected.flat_map(|p| &p.activities) {
                for task in &activity.tasks {
                    task_count += 1;
                    if task.status_score == Some(classify::COMPLETED_SCORE) {
                        completed += 1;
                    }
                }
            }

            FocusAreaPerformance {
                area,
                completion_rate: rate,
                budget_utilization: rate,
                task_success: percentage(completed as f64, task_count as f64),
            }
        })
        .collect()
}

pub fn total_beneficiaries(programs: &[Program]) -> i64 {
    programs
        .iter()
        .map(|p| p.beneficiaries_reached.unwrap_or(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Task};
    use chrono::Duration;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn task(score: Option<i32>, due_date: Option<NaiveDate>) -> Task {
        Task {
            id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            name: "Task".to_string(),
            status_score: score,
            due_date,
            evaluation_criteria: None,
            risks: None,
            mitigations: None,
            notes: None,
        }
    }

    fn program(
        area: FocusArea,
        budget_total: f64,
        budget_utilized: Option<f64>,
        tasks: Vec<Task>,
    ) -> Program {
        let id = Uuid::new_v4();
        Program {
            id,
            name: "Program".to_string(),
            focus_area: area,
            year: 2026,
            status: "active".to_string(),
            budget_total,
            location: "Nairobi".to_string(),
            beneficiaries_reached: None,
            activities: vec![Activity {
                id: Uuid::new_v4(),
                program_id: id,
                name: "Activity".to_string(),
                budget_allocated: budget_total,
                budget_utilized,
                progress_notes: None,
                tasks,
            }],
        }
    }

    #[test]
    fn percentage_short_circuits_on_zero_denominator() {
        assert_eq!(percentage(500.0, 0.0), 0);
        assert_eq!(percentage(0.0, 0.0), 0);
    }

    #[test]
    fn utilization_rate_rounds_to_nearest_integer() {
        let programs = vec![program(FocusArea::GbvManagement, 3000.0, Some(1000.0), vec![])];
        assert_eq!(utilization_rate(&programs), 33);
    }

    #[test]
    fn utilization_rate_is_zero_for_zero_budget_regardless_of_spend() {
        let programs = vec![program(FocusArea::SrhRights, 0.0, Some(5000.0), vec![])];
        assert_eq!(utilization_rate(&programs), 0);
    }

    #[test]
    fn missing_utilized_amounts_count_as_zero() {
        let programs = vec![program(FocusArea::GbvManagement, 1000.0, None, vec![])];
        assert_eq!(utilization_rate(&programs), 0);
    }

    #[test]
    fn worked_scenario_matches_expected_buckets() {
        // One program, 100000 budget, 40000 utilized, tasks scored 10, 6, unscored.
        let programs = vec![program(
            FocusArea::GbvManagement,
            100_000.0,
            Some(40_000.0),
            vec![task(Some(10), None), task(Some(6), None), task(None, None)],
        )];

        assert_eq!(utilization_rate(&programs), 40);
        let buckets = bucket_tasks(&programs, today());
        assert_eq!(buckets.completed, 1);
        assert_eq!(buckets.on_track, 0);
        assert_eq!(buckets.behind, 0);
        assert_eq!(buckets.at_risk, 0);
    }

    #[test]
    fn unscored_tasks_never_inflate_any_bucket() {
        let programs = vec![program(
            FocusArea::SurvivorEmpowerment,
            1000.0,
            None,
            vec![task(None, Some(today())), task(None, None), task(Some(10), None)],
        )];
        let buckets = bucket_tasks(&programs, today());
        assert_eq!(buckets.completed + buckets.on_track, 1);
        assert_eq!(buckets.behind, 0);
        assert_eq!(buckets.at_risk, 0);
    }

    #[test]
    fn behind_task_with_near_due_date_counts_in_both_buckets() {
        let due = today() + Duration::days(2);
        let programs = vec![program(
            FocusArea::GbvManagement,
            1000.0,
            None,
            vec![task(Some(3), Some(due))],
        )];
        let buckets = bucket_tasks(&programs, today());
        assert_eq!(buckets.behind, 1);
        assert_eq!(buckets.at_risk, 1);
    }

    #[test]
    fn rollup_emits_all_four_areas_in_declared_order() {
        let rows = focus_area_rollup(&[]);
        assert_eq!(rows.len(), 4);
        for (row, area) in rows.iter().zip(FocusArea::ALL) {
            assert_eq!(row.area, area);
            assert_eq!(row.completion_rate, 0);
            assert_eq!(row.budget_utilization, 0);
            assert_eq!(row.task_success, 0);
        }
    }

    #[test]
    fn rollup_scopes_rates_to_each_area() {
        let programs = vec![
            program(
                FocusArea::GbvManagement,
                10_000.0,
                Some(5_000.0),
                vec![task(Some(10), None), task(Some(4), None)],
            ),
            program(FocusArea::SrhRights, 20_000.0, Some(2_000.0), vec![]),
        ];
        let rows = focus_area_rollup(&programs);

        let gbv = &rows[0];
        assert_eq!(gbv.budget_utilization, 50);
        assert_eq!(gbv.completion_rate, 50);
        assert_eq!(gbv.task_success, 50);

        let srh = &rows[3];
        assert_eq!(srh.budget_utilization, 10);
        assert_eq!(srh.task_success, 0);
    }

    #[test]
    fn beneficiary_total_treats_absent_as_zero() {
        let mut with_metrics = program(FocusArea::GbvManagement, 0.0, None, vec![]);
        with_metrics.beneficiaries_reached = Some(1200);
        let without_metrics = program(FocusArea::SrhRights, 0.0, None, vec![]);
        assert_eq!(total_beneficiaries(&[with_metrics, without_metrics]), 1200);
    }
}
