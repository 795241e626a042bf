use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::models::{ScheduleSession, Weekday};

/// Academic years start in August.
const ACADEMIC_YEAR_START_MONTH: u32 = 8;

/// The academic year containing `today` followed by the `count - 1` before it,
/// formatted `"2024-2025"`.
pub fn academic_years(today: NaiveDate, count: usize) -> Vec<String> {
    let start = start_year(today);
    (0..count as i32)
        .map(|i| {
            let y = start - i;
            format!("{}-{}", y, y + 1)
        })
        .collect()
}

pub fn current_academic_year(today: NaiveDate) -> String {
    let start = start_year(today);
    format!("{}-{}", start, start + 1)
}

fn start_year(today: NaiveDate) -> i32 {
    if today.month() >= ACADEMIC_YEAR_START_MONTH {
        today.year()
    } else {
        today.year() - 1
    }
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    Weekday::from(date.weekday())
}

/// Active sessions falling on `date`'s weekday, earliest first.
pub fn sessions_on(sessions: &[ScheduleSession], date: NaiveDate) -> Vec<&ScheduleSession> {
    let day = weekday_of(date);
    let mut matching: Vec<&ScheduleSession> = sessions
        .iter()
        .filter(|s| s.is_active && s.weekday() == Some(day))
        .collect();
    matching.sort_by_key(|s| s.start_time);
    matching
}

/// Every date of the given month; empty for an invalid year/month.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// Concrete date of a weekly session within one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOccurrence {
    pub session_id: i64,
    pub date: NaiveDate,
}

/// Dates on which the active sessions occur in the week starting `monday`.
pub fn week_occurrences(monday: NaiveDate, sessions: &[ScheduleSession]) -> Vec<SessionOccurrence> {
    let mut occurrences: Vec<SessionOccurrence> = sessions
        .iter()
        .filter(|s| s.is_active)
        .filter_map(|s| {
            let offset = s.weekday()?.days_from_monday();
            let date = monday.checked_add_days(Days::new(u64::from(offset)))?;
            Some(SessionOccurrence {
                session_id: s.id,
                date,
            })
        })
        .collect();
    occurrences.sort_by_key(|o| o.date);
    occurrences
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}
