use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::calendar::{month_dates, sessions_on, weekday_of};
use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceStatus, ScheduleSession, Weekday};
use crate::upstream::{AttendanceQuery, PortalApi, ScheduleQuery};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub total_sessions: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
    /// Late counts as attended. Percentage rounded to two decimals.
    pub attendance_rate: f64,
}

impl AttendanceStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut stats = AttendanceStats::default();
        for record in records {
            stats.total_sessions += 1;
            match record.status {
                AttendanceStatus::Present => stats.present_count += 1,
                AttendanceStatus::Absent => stats.absent_count += 1,
                AttendanceStatus::Late => stats.late_count += 1,
            }
        }
        if stats.total_sessions > 0 {
            let attended = (stats.present_count + stats.late_count) as f64;
            let rate = attended / stats.total_sessions as f64 * 100.0;
            stats.attendance_rate = (rate * 100.0).round() / 100.0;
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

/// Per-date counts, oldest first.
pub fn daily_report(records: &[AttendanceRecord]) -> Vec<DailyAttendance> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }
    by_date
        .into_iter()
        .map(|(date, day)| {
            let stats = AttendanceStats::from_records(day);
            DailyAttendance {
                date,
                total: stats.total_sessions,
                present: stats.present_count,
                absent: stats.absent_count,
                late: stats.late_count,
            }
        })
        .collect()
}

/// Human-readable session a record belongs to, e.g.
/// `"Couture - Couture 1A (Monday 08:00)"`.
pub fn session_label(record: &AttendanceRecord) -> String {
    fn names(session: &ScheduleSession) -> (String, String) {
        let details = session.training_course_details.as_ref();
        let program = details.map(|tc| tc.program.name.clone()).unwrap_or_default();
        let course = details.and_then(|tc| tc.name.clone()).unwrap_or_default();
        (program, course)
    }

    if let Some(template) = &record.session_template_details {
        let (program, course) = names(template);
        return format!(
            "{} - {} ({} {})",
            program,
            course,
            template.day,
            template.start_time.format("%H:%M")
        );
    }
    if let Some(instance) = &record.session_instance_details {
        let (program, course) = names(&instance.schedule_template_details);
        return format!("{} - {} ({})", program, course, instance.specific_date);
    }
    "No session".to_string()
}

/// A trainer's attendance page for one date.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub sessions: Vec<ScheduleSession>,
    pub records: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
}

pub struct AttendanceService {
    api: Arc<dyn PortalApi>,
}

impl AttendanceService {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    /// Records taken on `date` by the calling trainer, next to the sessions
    /// that trainer teaches that weekday. Both fetches must succeed.
    pub async fn trainer_day(
        &self,
        token: &str,
        trainer_id: i64,
        date: NaiveDate,
    ) -> Result<AttendanceDay, AppError> {
        let query = AttendanceQuery {
            trainer_id: Some("me".to_string()),
            date: Some(date),
            ..Default::default()
        };
        let schedule_query = ScheduleQuery::default();
        let (records, schedule) = tokio::try_join!(
            self.api.attendance_records(token, &query),
            self.api.trainer_schedule(token, trainer_id, &schedule_query),
        )?;

        let sessions = sessions_on(&schedule.schedules, date)
            .into_iter()
            .cloned()
            .collect();
        let stats = AttendanceStats::from_records(&records);
        info!(
            "attendance day {} for trainer {}: {} records",
            date, trainer_id, stats.total_sessions
        );

        Ok(AttendanceDay {
            date,
            weekday: weekday_of(date),
            sessions,
            records,
            stats,
        })
    }

    pub async fn by_session(
        &self,
        token: &str,
        session_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        self.api.attendance_by_session(token, session_id, date).await
    }

    pub async fn stats(
        &self,
        token: &str,
        query: &AttendanceQuery,
    ) -> Result<(AttendanceStats, Vec<DailyAttendance>), AppError> {
        let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
            return Err(AppError::BadRequest(
                "start_date and end_date are required".to_string(),
            ));
        };
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let records = self.api.attendance_records(token, query).await?;
        Ok((AttendanceStats::from_records(&records), daily_report(&records)))
    }

    /// The calling trainer's attendance calendar for one month.
    pub async fn trainer_month(
        &self,
        token: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyAttendance>, AppError> {
        let dates = month_dates(year, month);
        let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
            return Err(AppError::BadRequest(format!(
                "invalid month {}-{:02}",
                year, month
            )));
        };
        let query = AttendanceQuery {
            trainer_id: Some("me".to_string()),
            start_date: Some(*first),
            end_date: Some(*last),
            ..Default::default()
        };
        let records = self.api.attendance_records(token, &query).await?;
        Ok(month_report(year, month, &records))
    }
}

/// One entry per day of the month, zero counts on days without records.
pub fn month_report(year: i32, month: u32, records: &[AttendanceRecord]) -> Vec<DailyAttendance> {
    let recorded = daily_report(records);
    month_dates(year, month)
        .into_iter()
        .map(|date| {
            recorded
                .iter()
                .find(|day| day.date == date)
                .cloned()
                .unwrap_or(DailyAttendance {
                    date,
                    total: 0,
                    present: 0,
                    absent: 0,
                    late: 0,
                })
        })
        .collect()
}
