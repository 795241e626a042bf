use serde::{Deserialize, Serialize};

use super::people::TrainerSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgram {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_years: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCourse {
    pub id: i64,
    pub program: ProgramSummary,
    pub center: CenterRef,
    #[serde(default)]
    pub trainer: Option<TrainerSummary>,
    pub academic_year: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub duration_years: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterRef {
    pub id: i64,
    pub name: String,
}

/// Training course as nested inside schedule sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCourseSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub program: ProgramSummary,
    #[serde(default)]
    pub center: Option<CenterRef>,
    #[serde(default)]
    pub academic_year: Option<String>,
}
