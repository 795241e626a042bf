pub mod attendance;
pub mod auth;
pub mod catalog;
pub mod import;
pub mod schedule;

pub use attendance::{AttendanceDay, AttendanceService, AttendanceStats, DailyAttendance};
pub use auth::{AuthService, LoginOutcome};
pub use catalog::{CatalogService, CenterDetails};
pub use import::BulkImport;
pub use schedule::{CenterOverview, GroupTimetable, ScheduleService, TrainerTimetable, TrainerWeek};
