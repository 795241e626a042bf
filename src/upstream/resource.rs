use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CRUD collections exposed by the backend, keyed by the slug the portal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Courses,
    Units,
    Sections,
    Lessons,
    Centers,
    Groups,
    Rooms,
    Equipment,
    Associations,
    Trainers,
    Students,
    TrainingPrograms,
    TrainingCourses,
    Users,
    ScheduleSessions,
    AttendanceRecords,
}

impl Resource {
    pub const ALL: [Resource; 16] = [
        Resource::Courses,
        Resource::Units,
        Resource::Sections,
        Resource::Lessons,
        Resource::Centers,
        Resource::Groups,
        Resource::Rooms,
        Resource::Equipment,
        Resource::Associations,
        Resource::Trainers,
        Resource::Students,
        Resource::TrainingPrograms,
        Resource::TrainingCourses,
        Resource::Users,
        Resource::ScheduleSessions,
        Resource::AttendanceRecords,
    ];

    /// Collection path relative to the API base, with trailing slash.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Courses => "courses/courses/",
            Resource::Units => "courses/units/",
            Resource::Sections => "courses/sections/",
            Resource::Lessons => "courses/lessons/",
            Resource::Centers => "centers-app/centers/",
            Resource::Groups => "centers-app/groups/",
            Resource::Rooms => "centers-app/rooms/",
            Resource::Equipment => "centers-app/equipment/",
            Resource::Associations => "associations/",
            Resource::Trainers => "teachers/teachers/",
            Resource::Students => "students/students/",
            Resource::TrainingPrograms => "programs/trainingprogrames/",
            Resource::TrainingCourses => "programs/trainingcourses/",
            Resource::Users => "accounts/users/",
            Resource::ScheduleSessions => "schedule/api/sessions/",
            Resource::AttendanceRecords => "attendance/api/records/",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Resource::Courses => "courses",
            Resource::Units => "units",
            Resource::Sections => "sections",
            Resource::Lessons => "lessons",
            Resource::Centers => "centers",
            Resource::Groups => "groups",
            Resource::Rooms => "rooms",
            Resource::Equipment => "equipment",
            Resource::Associations => "associations",
            Resource::Trainers => "trainers",
            Resource::Students => "students",
            Resource::TrainingPrograms => "training-programs",
            Resource::TrainingCourses => "training-courses",
            Resource::Users => "users",
            Resource::ScheduleSessions => "schedule-sessions",
            Resource::AttendanceRecords => "attendance-records",
        }
    }

    pub fn item_path(self, id: i64) -> String {
        format!("{}{}/", self.path(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.slug() == s)
            .ok_or_else(|| format!("unknown resource: {}", s))
    }
}
