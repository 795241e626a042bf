use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::people::Student;
use super::schedule::ScheduleSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub student: Option<i64>,
    /// Nested student record, used to show who the row is about.
    #[serde(default)]
    pub student_details: Option<Student>,
    #[serde(default)]
    pub session_template: Option<i64>,
    #[serde(default)]
    pub session_template_details: Option<ScheduleSession>,
    #[serde(default)]
    pub session_instance_details: Option<SessionInstanceDetails>,
}

/// A dated occurrence of a weekly session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInstanceDetails {
    pub id: i64,
    pub specific_date: NaiveDate,
    pub schedule_template_details: ScheduleSession,
}
