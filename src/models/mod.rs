pub mod account;
pub mod attendance;
pub mod center;
pub mod course;
pub mod people;
pub mod program;
pub mod schedule;

pub use account::{Credentials, Role, TokenPair, User};
pub use attendance::{AttendanceRecord, AttendanceStatus, SessionInstanceDetails};
pub use center::{Association, Center, Equipment, GroupSummary, Room};
pub use course::{Course, Lesson, Section, Unit};
pub use people::{PersonUser, Student, StudentUser, Trainer, TrainerSummary};
pub use program::{ProgramSummary, TrainingCourse, TrainingCourseSummary, TrainingProgram};
pub use schedule::{GroupSchedule, ScheduleSession, TrainerSchedule, Weekday};

/// Accepts either a bare name or a nested object carrying one, as the backend
/// serializes related fields both ways depending on the endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum NameRef {
    Id(i64),
    Name(String),
    Record { id: i64, name: String },
}

impl NameRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            NameRef::Id(_) => None,
            NameRef::Name(name) => Some(name),
            NameRef::Record { name, .. } => Some(name),
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            NameRef::Id(id) | NameRef::Record { id, .. } => Some(*id),
            NameRef::Name(name) => name.parse().ok(),
        }
    }
}
