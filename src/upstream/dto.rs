use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List responses come back either bare or wrapped in a pagination envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope {
    Page {
        results: Vec<Value>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<Value>),
}

impl ListEnvelope {
    pub fn into_items(self) -> Vec<Value> {
        match self {
            ListEnvelope::Page { results, .. } => results,
            ListEnvelope::Bare(items) => items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutRequest<'a> {
    pub refresh: &'a str,
}

/// Query for the trainer/group schedule endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleQuery {
    #[serde(default)]
    pub center_id: Option<i64>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

impl ScheduleQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(center_id) = self.center_id {
            pairs.push(("center_id", center_id.to_string()));
        }
        if let Some(year) = &self.academic_year {
            pairs.push(("academic_year", year.clone()));
        }
        pairs
    }
}

/// Filters accepted by the attendance records listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub start_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub end_date: Option<chrono::NaiveDate>,
}

impl AttendanceQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(trainer_id) = &self.trainer_id {
            pairs.push(("trainer_id", trainer_id.clone()));
        }
        if let Some(student_id) = self.student_id {
            pairs.push(("student_id", student_id.to_string()));
        }
        if let Some(date) = self.date {
            pairs.push(("date", date.to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.to_string()));
        }
        pairs.push(("page_size", "1000".to_string()));
        pairs
    }
}

/// File forwarded as multipart to an upload endpoint.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub fields: Vec<(String, String)>,
}
