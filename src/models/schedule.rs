use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::center::{GroupSummary, Room};
use super::people::TrainerSummary;
use super::program::TrainingCourseSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Days after Monday, 0..=6.
    pub fn days_from_monday(self) -> u32 {
        self as u32
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown day: {}", s))
    }
}

/// Weekly recurring session template.
///
/// `day` stays a raw string: the grid only places sessions whose day it
/// recognizes and reports the rest instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSession {
    pub id: i64,
    pub day: String,
    #[serde(with = "clock")]
    pub start_time: NaiveTime,
    #[serde(with = "clock")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub trainer: Option<i64>,
    #[serde(default)]
    pub trainer_details: Option<TrainerSummary>,
    #[serde(default)]
    pub room: Option<i64>,
    #[serde(default)]
    pub room_details: Option<Room>,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub group_details: Option<GroupSummary>,
    #[serde(default)]
    pub training_course: Option<i64>,
    #[serde(default)]
    pub training_course_details: Option<TrainingCourseSummary>,
}

impl ScheduleSession {
    pub fn weekday(&self) -> Option<Weekday> {
        self.day.parse().ok()
    }

    pub fn program_name(&self) -> Option<&str> {
        self.training_course_details
            .as_ref()
            .map(|tc| tc.program.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSchedule {
    pub trainer: TrainerSummary,
    pub schedules: Vec<ScheduleSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSchedule {
    pub group: GroupSummary,
    pub schedules: Vec<ScheduleSession>,
}

fn default_active() -> bool {
    true
}

/// `HH:MM[:SS]` wall-clock times as sent by the backend.
pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time: {}", raw)))
    }
}
