use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Activity, FocusArea, Program, ProgramFilters, Task};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let programs = vec![
        (
            Uuid::parse_str("7b1c9a64-5e2f-4d7a-9c1b-2f8e63a0d411")?,
            "Safe Shelter Network",
            FocusArea::GbvManagement,
            2026,
            "active",
            250_000.0,
            "Kisumu County",
            Some(640i64),
        ),
        (
            Uuid::parse_str("2f4d8c11-0b3a-4e69-8d52-71c9e5b20a83")?,
            "Thrive Again Livelihoods",
            FocusArea::SurvivorEmpowerment,
            2026,
            "active",
            180_000.0,
            "Nakuru County",
            Some(210i64),
        ),
        (
            Uuid::parse_str("c93e5f27-64a8-4b10-b7d4-08a12c3e9f56")?,
            "County Referral Strengthening",
            FocusArea::InstitutionalDevelopment,
            2025,
            "closing",
            95_000.0,
            "Nairobi County",
            None,
        ),
    ];

    for (id, name, focus_area, year, status, budget, location, beneficiaries) in programs {
        sqlx::query(
            r#"
            INSERT INTO program_analytics.programs
            (id, name, focus_area, year, status, budget_total, location, beneficiaries_reached)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO UPDATE
            SET focus_area = EXCLUDED.focus_area,
                year = EXCLUDED.year,
                status = EXCLUDED.status,
                budget_total = EXCLUDED.budget_total,
                location = EXCLUDED.location,
                beneficiaries_reached = EXCLUDED.beneficiaries_reached
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(focus_area.label())
        .bind(year)
        .bind(status)
        .bind(budget)
        .bind(location)
        .bind(beneficiaries)
        .execute(pool)
        .await?;
    }

    let activities = vec![
        (
            Uuid::parse_str("5a2e7c90-1f46-4b3d-8e07-9d64b1c52a38")?,
            "Safe Shelter Network",
            "Shelter operations and case intake",
            120_000.0,
            Some(74_000.0),
            Some("Two shelters at full occupancy since January"),
        ),
        (
            Uuid::parse_str("9d40b6e3-7c21-45f8-a19b-3e85d0c47f62")?,
            "Thrive Again Livelihoods",
            "Vocational training cohorts",
            80_000.0,
            Some(31_500.0),
            None,
        ),
        (
            Uuid::parse_str("e17f3a85-2d94-4c60-b538-60a9f4e21d07")?,
            "County Referral Strengthening",
            "Referral desk setup in county hospitals",
            60_000.0,
            None,
            Some("Procurement delayed a quarter"),
        ),
    ];

    for (id, program_name, name, allocated, utilized, notes) in activities {
        let program_id: Uuid =
            sqlx::query("SELECT id FROM program_analytics.programs WHERE name = $1")
                .bind(program_name)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO program_analytics.activities
            (id, program_id, name, budget_allocated, budget_utilized, progress_notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET budget_allocated = EXCLUDED.budget_allocated,
                budget_utilized = EXCLUDED.budget_utilized,
                progress_notes = EXCLUDED.progress_notes
            "#,
        )
        .bind(id)
        .bind(program_id)
        .bind(name)
        .bind(allocated)
        .bind(utilized)
        .bind(notes)
        .execute(pool)
        .await?;
    }

    let tasks = vec![
        (
            Uuid::parse_str("1c8d5b72-3e09-4f41-a6d8-57b2c90e14a3")?,
            Uuid::parse_str("5a2e7c90-1f46-4b3d-8e07-9d64b1c52a38")?,
            "Quarterly shelter safety audit",
            Some(10),
            NaiveDate::from_ymd_opt(2026, 2, 15),
            Some("All exits and intake logs reviewed"),
        ),
        (
            Uuid::parse_str("6e93a0d4-81b7-4c25-9f60-b43e7a18c5d9")?,
            Uuid::parse_str("5a2e7c90-1f46-4b3d-8e07-9d64b1c52a38")?,
            "Counselor refresher training",
            Some(6),
            NaiveDate::from_ymd_opt(2026, 3, 6),
            None,
        ),
        (
            Uuid::parse_str("b25f718c-4a63-4d09-8e17-09c6d3f42b81")?,
            Uuid::parse_str("9d40b6e3-7c21-45f8-a19b-3e85d0c47f62")?,
            "Enroll second training cohort",
            Some(3),
            NaiveDate::from_ymd_opt(2026, 3, 20),
            None,
        ),
        (
            Uuid::parse_str("48a1d9e6-0c57-4b82-af34-d21e85b60c97")?,
            Uuid::parse_str("e17f3a85-2d94-4c60-b538-60a9f4e21d07")?,
            "Sign MOU with county health office",
            None,
            None,
            Some("Awaiting legal review"),
        ),
    ];

    for (id, activity_id, name, score, due_date, notes) in tasks {
        sqlx::query(
            r#"
            INSERT INTO program_analytics.tasks
            (id, activity_id, name, status_score, due_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET status_score = EXCLUDED.status_score,
                due_date = EXCLUDED.due_date,
                notes = EXCLUDED.notes
            "#,
        )
        .bind(id)
        .bind(activity_id)
        .bind(name)
        .bind(score)
        .bind(due_date)
        .bind(notes)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Fetches the full Program -> Activity -> Task hierarchy matching the
/// filters, fully materialized. Three queries, assembled in memory; nothing
/// downstream touches the database again.
pub async fn fetch_programs(
    pool: &PgPool,
    filters: &ProgramFilters,
) -> anyhow::Result<Vec<Program>> {
    let mut query = String::from(
        "SELECT id, name, focus_area, year, status, budget_total, location, \
         beneficiaries_reached \
         FROM program_analytics.programs WHERE 1 = 1",
    );

    let mut bind_index = 0;
    if filters.program_id.is_some() {
        bind_index += 1;
        query.push_str(&format!(" AND id = ${bind_index}"));
    }
    if filters.focus_area.is_some() {
        bind_index += 1;
        query.push_str(&format!(" AND focus_area = ${bind_index}"));
    }
    if filters.year.is_some() {
        bind_index += 1;
        query.push_str(&format!(" AND year = ${bind_index}"));
    }
    query.push_str(" ORDER BY name");

    let mut rows = sqlx::query(&query);
    if let Some(id) = filters.program_id {
        rows = rows.bind(id);
    }
    if let Some(area) = filters.focus_area {
        rows = rows.bind(area.label());
    }
    if let Some(year) = filters.year {
        rows = rows.bind(year);
    }

    let mut programs = Vec::new();
    for row in rows.fetch_all(pool).await? {
        let focus_label: String = row.get("focus_area");
        let focus_area = FocusArea::from_label(&focus_label)
            .with_context(|| format!("unknown focus area {focus_label:?} in programs table"))?;

        programs.push(Program {
            id: row.get("id"),
            name: row.get("name"),
            focus_area,
            year: row.get("year"),
            status: row.get("status"),
            budget_total: row.get("budget_total"),
            location: row.get("location"),
            beneficiaries_reached: row.get("beneficiaries_reached"),
            activities: Vec::new(),
        });
    }

    if programs.is_empty() {
        return Ok(programs);
    }

    let program_ids: Vec<Uuid> = programs.iter().map(|p| p.id).collect();
    let activity_rows = sqlx::query(
        "SELECT id, program_id, name, budget_allocated, budget_utilized, progress_notes \
         FROM program_analytics.activities WHERE program_id = ANY($1) ORDER BY name",
    )
    .bind(&program_ids)
    .fetch_all(pool)
    .await?;

    let mut activities = Vec::new();
    for row in activity_rows {
        activities.push(Activity {
            id: row.get("id"),
            program_id: row.get("program_id"),
            name: row.get("name"),
            budget_allocated: row.get("budget_allocated"),
            budget_utilized: row.get("budget_utilized"),
            progress_notes: row.get("progress_notes"),
            tasks: Vec::new(),
        });
    }

    let activity_ids: Vec<Uuid> = activities.iter().map(|a| a.id).collect();
    let mut tasks_by_activity: HashMap<Uuid, Vec<Task>> = HashMap::new();
    if !activity_ids.is_empty() {
        let task_rows = sqlx::query(
            "SELECT id, activity_id, name, status_score, due_date, \
             evaluation_criteria, risks, mitigations, notes \
             FROM program_analytics.tasks WHERE activity_id = ANY($1) ORDER BY name",
        )
        .bind(&activity_ids)
        .fetch_all(pool)
        .await?;

        for row in task_rows {
            let task = Task {
                id: row.get("id"),
                activity_id: row.get("activity_id"),
                name: row.get("name"),
                status_score: row.get("status_score"),
                due_date: row.get("due_date"),
                evaluation_criteria: row.get("evaluation_criteria"),
                risks: row.get("risks"),
                mitigations: row.get("mitigations"),
                notes: row.get("notes"),
            };
            tasks_by_activity.entry(task.activity_id).or_default().push(task);
        }
    }

    let mut activities_by_program: HashMap<Uuid, Vec<Activity>> = HashMap::new();
    for mut activity in activities {
        activity.tasks = tasks_by_activity.remove(&activity.id).unwrap_or_default();
        activities_by_program
            .entry(activity.program_id)
            .or_default()
            .push(activity);
    }

    for program in &mut programs {
        program.activities = activities_by_program.remove(&program.id).unwrap_or_default();
    }

    Ok(programs)
}
