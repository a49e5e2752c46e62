use chrono::{Months, NaiveDate};

use crate::metrics;
use crate::models::{
    AnalyticsSummary, Overview, Program, RiskEntry, TrendPoint, TrendSeries,
};

const TREND_PERIODS: u32 = 6;

/// Fixed reference catalogs shown alongside the computed metrics. These are
/// configuration maintained with the programs team, not derived from input.
const COMMON_CHALLENGES: &[&str] = &[
    "Underreporting of GBV cases in rural service areas",
    "Survivor follow-up lost after shelter exit",
    "Delayed disbursement of partner grant tranches",
    "Staff turnover in county-level response units",
    "Limited referral pathways for SRH services",
];

const RISK_CATALOG: &[RiskEntry] = &[
    RiskEntry {
        risk: "Donor funding gap at mid-year review",
        likelihood: "medium",
        mitigation: "Diversify grant pipeline and stage activity budgets",
    },
    RiskEntry {
        risk: "Community resistance to survivor reintegration",
        likelihood: "medium",
        mitigation: "Engage local leadership before reintegration visits",
    },
    RiskEntry {
        risk: "Data loss from paper-based case intake",
        likelihood: "low",
        mitigation: "Digitize intake forms at county offices",
    },
    RiskEntry {
        risk: "Security incidents during field outreach",
        likelihood: "low",
        mitigation: "Pair field officers and log movement plans",
    },
];

/// Composes the full analytics summary for a fetched selection of programs.
/// Pure and stateless; safe to call concurrently.
pub fn build_summary(programs: &[Program], today: NaiveDate) -> AnalyticsSummary {
    let rate = metrics::utilization_rate(programs);

    AnalyticsSummary {
        overview: Overview {
            total_programs: programs.len(),
            // Inherited reporting convention: completion is read off budget
            // utilization until task-based completion is signed off.
            overall_completion: rate,
            budget_utilization: rate,
            total_beneficiaries: metrics::total_beneficiaries(programs),
        },
        task_performance: metrics::bucket_tasks(programs, today),
        focus_area_performance: metrics::focus_area_rollup(programs),
        common_challenges: COMMON_CHALLENGES.to_vec(),
        risk_analysis: RISK_CATALOG.to_vec(),
        trends: placeholder_trends(today),
    }
}

/// Trailing six-period trend block. Historical snapshots are not recorded
/// yet, so every point is zero and the series is tagged as a placeholder;
/// consumers must not chart it as measured data.
fn placeholder_trends(today: NaiveDate) -> TrendSeries {
    let points = (0..TREND_PERIODS)
        .rev()
        .map(|back| TrendPoint {
            period: (today - Months::new(back)).format("%Y-%m").to_string(),
            completion: 0,
            budget_utilization: 0,
        })
        .collect();

    TrendSeries {
        source: "placeholder",
        points,
    }
}
