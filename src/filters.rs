//! List filtering for already-fetched records. All text matching is a
//! case-insensitive substring test; empty criteria match everything.

use serde::Deserialize;

use crate::models::{Association, AttendanceRecord, Center, Student, Trainer};
use crate::services::attendance::session_label;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn matches(self, is_active: bool) -> bool {
        match self {
            ActiveStatus::All => true,
            ActiveStatus::Active => is_active,
            ActiveStatus::Inactive => !is_active,
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search_hits<'a>(term: Option<&str>, fields: impl IntoIterator<Item = &'a str>) -> bool {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => true,
        Some(term) => fields.into_iter().any(|field| contains_ci(field, term)),
    }
}

fn exact(expected: Option<&str>, actual: Option<&str>) -> bool {
    match expected.filter(|e| !e.is_empty() && *e != "all") {
        None => true,
        Some(expected) => actual == Some(expected),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainerFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub center: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub status: ActiveStatus,
}

impl TrainerFilter {
    pub fn matches(&self, trainer: &Trainer) -> bool {
        let center = trainer.center.as_deref().unwrap_or_default();
        let program = trainer.program_name.as_deref().unwrap_or_default();
        search_hits(
            self.search.as_deref(),
            [
                trainer.user.first_name.as_str(),
                trainer.user.last_name.as_str(),
                trainer.user.email.as_str(),
                center,
                program,
            ],
        ) && exact(self.center.as_deref(), trainer.center.as_deref())
            && exact(self.program.as_deref(), trainer.program_name.as_deref())
            && exact(self.contract.as_deref(), trainer.contract_with.as_deref())
            && self.status.matches(trainer.user.is_active)
    }

    pub fn apply(&self, mut trainers: Vec<Trainer>) -> Vec<Trainer> {
        trainers.retain(|t| self.matches(t));
        trainers
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    #[serde(default)]
    pub search: Option<String>,
    /// Program id or name.
    #[serde(default)]
    pub program: Option<String>,
    /// Group id or name.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub status: ActiveStatus,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        let mut fields = student.user.search_fields();
        fields.push(student.exam_id.as_str());
        search_hits(self.search.as_deref(), fields)
            && ref_matches(self.program.as_deref(), student.program.as_ref())
            && ref_matches(self.group.as_deref(), student.group.as_ref())
            && self.status.matches(student.user.is_active())
    }

    pub fn apply(&self, mut students: Vec<Student>) -> Vec<Student> {
        students.retain(|s| self.matches(s));
        students
    }
}

fn ref_matches(expected: Option<&str>, actual: Option<&crate::models::NameRef>) -> bool {
    let Some(expected) = expected.filter(|e| !e.is_empty() && *e != "all") else {
        return true;
    };
    let Some(actual) = actual else {
        return false;
    };
    actual.name() == Some(expected)
        || actual
            .id()
            .zip(expected.parse::<i64>().ok())
            .is_some_and(|(a, e)| a == e)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CenterFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub status: ActiveStatus,
}

impl CenterFilter {
    pub fn matches(&self, center: &Center) -> bool {
        search_hits(
            self.search.as_deref(),
            [
                center.name.as_str(),
                center.city.as_deref().unwrap_or_default(),
                center.email.as_deref().unwrap_or_default(),
            ],
        ) && self
            .city
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
            .is_none_or(|city| {
                center
                    .city
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(city))
            })
            && self.status.matches(center.is_active.unwrap_or(true))
    }

    pub fn apply(&self, mut centers: Vec<Center>) -> Vec<Center> {
        centers.retain(|c| self.matches(c));
        centers
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssociationFilter {
    #[serde(default)]
    pub search: Option<String>,
}

impl AssociationFilter {
    pub fn matches(&self, association: &Association) -> bool {
        search_hits(
            self.search.as_deref(),
            [
                association.name.as_str(),
                association.city.as_deref().unwrap_or_default(),
            ],
        )
    }

    pub fn apply(&self, mut associations: Vec<Association>) -> Vec<Association> {
        associations.retain(|a| self.matches(a));
        associations
    }
}

/// Attendance records whose student name, notes or session description
/// contain `term`.
pub fn search_attendance<'a>(records: &'a [AttendanceRecord], term: &str) -> Vec<&'a AttendanceRecord> {
    records
        .iter()
        .filter(|rec| {
            let label = session_label(rec);
            let student = rec
                .student_details
                .as_ref()
                .map(|s| s.user.display_name())
                .unwrap_or_default();
            search_hits(
                Some(term),
                [
                    student.as_str(),
                    rec.notes.as_deref().unwrap_or_default(),
                    label.as_str(),
                ],
            )
        })
        .collect()
}
