use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::calendar::{
    SessionOccurrence, academic_years, current_academic_year, week_occurrences, week_start,
};
use crate::error::AppError;
use crate::models::{Center, GroupSummary, Role, ScheduleSession, TrainerSummary, User};
use crate::timetable::Timetable;
use crate::upstream::{PortalApi, Resource, ScheduleQuery, fetch_list};

/// Number of academic years offered in the year picker.
const YEAR_CHOICES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct TrainerTimetable {
    pub trainer: TrainerSummary,
    pub academic_year: String,
    pub academic_years: Vec<String>,
    pub programs: Vec<String>,
    pub timetable: Timetable,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupTimetable {
    pub group: GroupSummary,
    pub academic_year: String,
    pub academic_years: Vec<String>,
    pub timetable: Timetable,
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterOverview {
    pub center: Center,
    pub academic_year: String,
    pub trainers: Vec<TrainerSummary>,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainerWeek {
    pub week_start: NaiveDate,
    pub occurrences: Vec<SessionOccurrence>,
}

/// Distinct program names across sessions, sorted.
pub fn program_names(sessions: &[ScheduleSession]) -> Vec<String> {
    sessions
        .iter()
        .filter_map(|s| s.program_name())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct ScheduleService {
    api: Arc<dyn PortalApi>,
}

impl ScheduleService {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    pub async fn trainer_timetable(
        &self,
        token: &str,
        trainer_id: i64,
        query: ScheduleQuery,
        today: NaiveDate,
    ) -> Result<TrainerTimetable, AppError> {
        let query = with_default_year(query, today);
        let schedule = self.api.trainer_schedule(token, trainer_id, &query).await?;
        let timetable = Timetable::build(&schedule.schedules);
        log_grid("trainer", trainer_id, &timetable);

        Ok(TrainerTimetable {
            trainer: schedule.trainer,
            academic_year: query.academic_year.unwrap_or_default(),
            academic_years: academic_years(today, YEAR_CHOICES),
            programs: program_names(&schedule.schedules),
            timetable,
        })
    }

    pub async fn group_timetable(
        &self,
        token: &str,
        group_id: i64,
        query: ScheduleQuery,
        today: NaiveDate,
    ) -> Result<GroupTimetable, AppError> {
        let query = with_default_year(query, today);
        let schedule = self.api.group_schedule(token, group_id, &query).await?;
        let timetable = Timetable::build(&schedule.schedules);
        log_grid("group", group_id, &timetable);

        Ok(GroupTimetable {
            group: schedule.group,
            academic_year: query.academic_year.unwrap_or_default(),
            academic_years: academic_years(today, YEAR_CHOICES),
            timetable,
        })
    }

    /// Dated sessions for the week containing `date`.
    pub async fn trainer_week(
        &self,
        token: &str,
        trainer_id: i64,
        date: NaiveDate,
    ) -> Result<TrainerWeek, AppError> {
        let query = with_default_year(ScheduleQuery::default(), date);
        let schedule = self.api.trainer_schedule(token, trainer_id, &query).await?;
        let monday = week_start(date);
        Ok(TrainerWeek {
            week_start: monday,
            occurrences: week_occurrences(monday, &schedule.schedules),
        })
    }

    /// The center supervised by `user`, with the trainers and groups that
    /// have sessions there. Trainers and groups are fetched concurrently and
    /// either failure fails the whole overview.
    pub async fn center_overview(
        &self,
        token: &str,
        user: &User,
        academic_year: Option<String>,
        today: NaiveDate,
    ) -> Result<CenterOverview, AppError> {
        if user.role != Role::CenterSupervisor {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        let centers: Vec<Center> = fetch_list(self.api.as_ref(), token, Resource::Centers, &[]).await?;
        let Some(center) = centers.into_iter().find(|c| c.supervisor == Some(user.id)) else {
            warn!("no center assigned to supervisor {}", user.id);
            return Err(AppError::Forbidden("No center assigned".to_string()));
        };

        let academic_year = academic_year.unwrap_or_else(|| current_academic_year(today));
        let (trainers, groups) = tokio::try_join!(
            self.api.trainers_by_center(token, center.id, Some(&academic_year)),
            self.api.groups_by_center(token, center.id, Some(&academic_year)),
        )?;
        info!(
            "center {} overview: {} trainers, {} groups",
            center.id,
            trainers.len(),
            groups.len()
        );

        Ok(CenterOverview {
            center,
            academic_year,
            trainers,
            groups,
        })
    }
}

fn with_default_year(mut query: ScheduleQuery, today: NaiveDate) -> ScheduleQuery {
    if query.academic_year.as_deref().is_none_or(str::is_empty) {
        query.academic_year = Some(current_academic_year(today));
    }
    query
}

fn log_grid(kind: &str, id: i64, timetable: &Timetable) {
    info!("{} {} timetable: {} sessions placed", kind, id, timetable.occupied());
    if !timetable.conflicts.is_empty() {
        warn!(
            "{} {} timetable has {} overlapping sessions",
            kind,
            id,
            timetable.conflicts.len()
        );
    }
}
