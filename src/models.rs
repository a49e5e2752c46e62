use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use uuid::Uuid;

/// The closed set of thematic areas a program belongs to. Declared once;
/// the rollup iterates `ALL` in this order and the CLI filter parses into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum FocusArea {
    #[serde(rename = "GBV Management")]
    GbvManagement,
    #[serde(rename = "Survivor Empowerment")]
    SurvivorEmpowerment,
    #[serde(rename = "Institutional Development")]
    InstitutionalDevelopment,
    #[serde(rename = "SRH Rights")]
    SrhRights,
}

impl FocusArea {
    pub const ALL: [FocusArea; 4] = [
        FocusArea::GbvManagement,
        FocusArea::SurvivorEmpowerment,
        FocusArea::InstitutionalDevelopment,
        FocusArea::SrhRights,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::GbvManagement => "GBV Management",
            FocusArea::SurvivorEmpowerment => "Survivor Empowerment",
            FocusArea::InstitutionalDevelopment => "Institutional Development",
            FocusArea::SrhRights => "SRH Rights",
        }
    }

    pub fn from_label(value: &str) -> Option<FocusArea> {
        FocusArea::ALL.iter().copied().find(|area| area.label() == value)
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub focus_area: FocusArea,
    pub year: i32,
    pub status: String,
    pub budget_total: f64,
    pub location: String,
    pub beneficiaries_reached: Option<i64>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
    pub budget_allocated: f64,
    pub budget_utilized: Option<f64>,
    pub progress_notes: Option<String>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub name: String,
    pub status_score: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub evaluation_criteria: Option<String>,
    pub risks: Option<String>,
    pub mitigations: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramFilters {
    pub program_id: Option<Uuid>,
    pub focus_area: Option<FocusArea>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_programs: usize,
    // overall_completion and budget_utilization carry the same ratio; the
    // back office has always shown one number under both labels.
    pub overall_completion: u32,
    pub budget_utilization: u32,
    pub total_beneficiaries: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPerformance {
    pub completed: usize,
    pub on_track: usize,
    pub behind: usize,
    pub at_risk: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusAreaPerformance {
    pub area: FocusArea,
    pub completion_rate: u32,
    pub budget_utilization: u32,
    pub task_success: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskEntry {
    pub risk: &'static str,
    pub likelihood: &'static str,
    pub mitigation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub completion: u32,
    pub budget_utilization: u32,
}

/// Trailing trend block. `source` is always "placeholder": historical
/// snapshots are not tracked yet, so the points are zero-valued markers,
/// never synthesized numbers.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
    pub source: &'static str,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub overview: Overview,
    pub task_performance: TaskPerformance,
    pub focus_area_performance: Vec<FocusAreaPerformance>,
    pub common_challenges: Vec<&'static str>,
    pub risk_analysis: Vec<RiskEntry>,
    pub trends: TrendSeries,
}
