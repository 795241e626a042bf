//! Weekly timetable grid: seven days by six fixed time slots.
//!
//! A session is placed in the first slot of its day that it overlaps
//! (`start < slot.end && end > slot.start`). Inactive sessions are skipped.
//! When two sessions land in the same cell the later one in input order
//! is shown and the collision is reported in [`Timetable::conflicts`].

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::models::{ScheduleSession, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    /// Seconds since midnight.
    start: u32,
    end: u32,
}

impl TimeSlot {
    pub const fn new(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Self {
        Self {
            start: start_h * 3600 + start_m * 60,
            end: end_h * 3600 + end_m * 60,
        }
    }

    /// `"HH:MM - HH:MM"`
    pub fn label(&self) -> String {
        format!("{} - {}", hhmm(self.start), hhmm(self.end))
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        let start = start.num_seconds_from_midnight();
        let end = end.num_seconds_from_midnight();
        start < self.end && end > self.start
    }
}

fn hhmm(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

pub const STANDARD_SLOTS: [TimeSlot; 6] = [
    TimeSlot::new(8, 0, 10, 30),
    TimeSlot::new(10, 30, 12, 30),
    TimeSlot::new(12, 30, 14, 30),
    TimeSlot::new(14, 30, 16, 30),
    TimeSlot::new(16, 30, 18, 30),
    TimeSlot::new(18, 30, 20, 30),
];

#[derive(Debug, Clone, Serialize)]
pub struct TimetableCell {
    pub slot: String,
    pub session: Option<ScheduleSession>,
    pub is_empty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRow {
    pub day: Weekday,
    pub cells: Vec<TimetableCell>,
}

/// Two sessions that resolved to the same cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotConflict {
    pub day: Weekday,
    pub slot: String,
    pub shown_session: i64,
    pub hidden_session: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timetable {
    pub slots: Vec<String>,
    pub days: Vec<DayRow>,
    pub conflicts: Vec<SlotConflict>,
    /// Active sessions with an unknown day or outside every slot.
    pub unplaced: Vec<i64>,
}

impl Timetable {
    pub fn build(sessions: &[ScheduleSession]) -> Self {
        Self::build_with_slots(sessions, &STANDARD_SLOTS)
    }

    pub fn build_with_slots(sessions: &[ScheduleSession], slots: &[TimeSlot]) -> Self {
        let labels: Vec<String> = slots.iter().map(TimeSlot::label).collect();
        let mut days: Vec<DayRow> = Weekday::ALL
            .into_iter()
            .map(|day| DayRow {
                day,
                cells: labels
                    .iter()
                    .map(|label| TimetableCell {
                        slot: label.clone(),
                        session: None,
                        is_empty: true,
                    })
                    .collect(),
            })
            .collect();
        let mut conflicts = Vec::new();
        let mut unplaced = Vec::new();

        for session in sessions.iter().filter(|s| s.is_active) {
            let Some(day) = session.weekday() else {
                unplaced.push(session.id);
                continue;
            };
            let Some(slot_idx) = slots
                .iter()
                .position(|slot| slot.overlaps(session.start_time, session.end_time))
            else {
                unplaced.push(session.id);
                continue;
            };

            let cell = &mut days[day.days_from_monday() as usize].cells[slot_idx];
            if let Some(previous) = &cell.session {
                conflicts.push(SlotConflict {
                    day,
                    slot: cell.slot.clone(),
                    shown_session: session.id,
                    hidden_session: previous.id,
                });
            }
            cell.session = Some(session.clone());
            cell.is_empty = false;
        }

        Self {
            slots: labels,
            days,
            conflicts,
            unplaced,
        }
    }

    pub fn cell(&self, day: Weekday, slot_label: &str) -> Option<&TimetableCell> {
        self.days
            .iter()
            .find(|row| row.day == day)?
            .cells
            .iter()
            .find(|cell| cell.slot == slot_label)
    }

    pub fn cells(&self) -> impl Iterator<Item = (Weekday, &TimetableCell)> {
        self.days
            .iter()
            .flat_map(|row| row.cells.iter().map(move |cell| (row.day, cell)))
    }

    pub fn occupied(&self) -> usize {
        self.cells().filter(|(_, cell)| !cell.is_empty).count()
    }
}
