mod extract;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

pub use extract::Bearer;
use extract::{JsonBody, MultipartForm, Path, Query};

use crate::error::AppError;
use crate::filters::{
    AssociationFilter, CenterFilter, StudentFilter, TrainerFilter, search_attendance,
};
use crate::models::*;
use crate::services::attendance::{AttendanceDay, AttendanceStats, DailyAttendance};
use crate::services::import::MAX_IMPORT_BYTES;
use crate::services::{
    AttendanceService, AuthService, BulkImport, CatalogService, CenterDetails, CenterOverview,
    GroupTimetable, LoginOutcome, ScheduleService, TrainerTimetable, TrainerWeek,
};
use crate::state::AppState;
use crate::upstream::{AttendanceQuery, Resource, ScheduleQuery, fetch_list};

/// Multipart framing on top of the spreadsheet itself.
const IMPORT_BODY_LIMIT: usize = MAX_IMPORT_BYTES + 64 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/schedule/trainers/me/timetable", get(my_timetable))
        .route("/schedule/trainers/me/week", get(my_week))
        .route("/schedule/trainers/{id}/timetable", get(trainer_timetable))
        .route("/schedule/groups/{id}/timetable", get(group_timetable))
        .route("/centers/mine/overview", get(center_overview))
        .route("/centers/{id}", get(center_details))
        .route("/rooms/{id}", get(room))
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(course))
        .route("/programs", get(list_programs))
        .route("/training-courses", get(list_training_courses))
        .route("/attendance/day", get(attendance_day))
        .route("/attendance/month", get(attendance_month))
        .route("/attendance/stats", get(attendance_stats))
        .route("/attendance/sessions/{id}", get(session_attendance))
        .route("/trainers", get(list_trainers))
        .route("/students", get(list_students))
        .route("/centers", get(list_centers))
        .route("/associations", get(list_associations))
        .route(
            "/students/import",
            post(import_students).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/resources/{resource}", get(list_resource).post(create_resource))
        .route(
            "/resources/{resource}/{id}",
            get(get_resource)
                .patch(update_resource)
                .put(replace_resource)
                .delete(delete_resource),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct LogoutRequest {
    refresh: String,
}

#[derive(Deserialize)]
struct DateParams {
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    search: Option<String>,
}

#[derive(Deserialize)]
struct MonthParams {
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
}

#[derive(Deserialize)]
struct YearParams {
    #[serde(default)]
    academic_year: Option<String>,
}

#[derive(Deserialize)]
struct ProgramParams {
    #[serde(default)]
    program: Option<i64>,
}

#[derive(Serialize)]
struct StatsReport {
    stats: AttendanceStats,
    daily: Vec<DailyAttendance>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<LoginOutcome>, AppError> {
    let outcome = AuthService::new(state.api.clone()).login(&credentials).await?;
    Ok(Json(outcome))
}

async fn logout(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LogoutRequest>,
) -> StatusCode {
    AuthService::new(state.api.clone()).logout(&req.refresh).await;
    StatusCode::NO_CONTENT
}

async fn me(State(state): State<AppState>, Bearer(token): Bearer) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.api.clone()).current_user(&token).await?;
    Ok(Json(user))
}

async fn my_timetable(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<TrainerTimetable>, AppError> {
    let user = AuthService::new(state.api.clone())
        .require_role(&token, &[Role::Trainer])
        .await?;
    let timetable = ScheduleService::new(state.api.clone())
        .trainer_timetable(&token, user.id, query, today())
        .await?;
    Ok(Json(timetable))
}

async fn my_week(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<DateParams>,
) -> Result<Json<TrainerWeek>, AppError> {
    let user = AuthService::new(state.api.clone())
        .require_role(&token, &[Role::Trainer])
        .await?;
    let week = ScheduleService::new(state.api.clone())
        .trainer_week(&token, user.id, params.date.unwrap_or_else(today))
        .await?;
    Ok(Json(week))
}

async fn trainer_timetable(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<TrainerTimetable>, AppError> {
    let timetable = ScheduleService::new(state.api.clone())
        .trainer_timetable(&token, id, query, today())
        .await?;
    Ok(Json(timetable))
}

async fn group_timetable(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<GroupTimetable>, AppError> {
    let timetable = ScheduleService::new(state.api.clone())
        .group_timetable(&token, id, query, today())
        .await?;
    Ok(Json(timetable))
}

async fn center_overview(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<YearParams>,
) -> Result<Json<CenterOverview>, AppError> {
    let user = AuthService::new(state.api.clone()).current_user(&token).await?;
    let year = params.academic_year.filter(|y| !y.trim().is_empty());
    let overview = ScheduleService::new(state.api.clone())
        .center_overview(&token, &user, year, today())
        .await?;
    Ok(Json(overview))
}

async fn attendance_day(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<DateParams>,
) -> Result<Json<AttendanceDay>, AppError> {
    let user = AuthService::new(state.api.clone())
        .require_role(&token, &[Role::Trainer])
        .await?;
    let mut day = AttendanceService::new(state.api.clone())
        .trainer_day(&token, user.id, params.date.unwrap_or_else(today))
        .await?;
    if let Some(term) = params.search.as_deref().filter(|t| !t.trim().is_empty()) {
        day.records = search_attendance(&day.records, term)
            .into_iter()
            .cloned()
            .collect();
    }
    Ok(Json(day))
}

async fn attendance_month(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<MonthParams>,
) -> Result<Json<Vec<DailyAttendance>>, AppError> {
    AuthService::new(state.api.clone())
        .require_role(&token, &[Role::Trainer])
        .await?;
    let now = today();
    let month = AttendanceService::new(state.api.clone())
        .trainer_month(
            &token,
            params.year.unwrap_or(now.year()),
            params.month.unwrap_or(now.month()),
        )
        .await?;
    Ok(Json(month))
}

async fn attendance_stats(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<StatsReport>, AppError> {
    let (stats, daily) = AttendanceService::new(state.api.clone())
        .stats(&token, &query)
        .await?;
    Ok(Json(StatsReport { stats, daily }))
}

async fn session_attendance(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
    Query(params): Query<DateParams>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = AttendanceService::new(state.api.clone())
        .by_session(&token, id, params.date.unwrap_or_else(today))
        .await?;
    Ok(Json(records))
}

async fn list_trainers(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(filter): Query<TrainerFilter>,
) -> Result<Json<Vec<Trainer>>, AppError> {
    let trainers: Vec<Trainer> =
        fetch_list(state.api.as_ref(), &token, Resource::Trainers, &[]).await?;
    Ok(Json(filter.apply(trainers)))
}

async fn list_students(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<Vec<Student>>, AppError> {
    let students: Vec<Student> =
        fetch_list(state.api.as_ref(), &token, Resource::Students, &[]).await?;
    Ok(Json(filter.apply(students)))
}

async fn list_centers(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(filter): Query<CenterFilter>,
) -> Result<Json<Vec<Center>>, AppError> {
    let centers: Vec<Center> =
        fetch_list(state.api.as_ref(), &token, Resource::Centers, &[]).await?;
    Ok(Json(filter.apply(centers)))
}

async fn list_associations(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(filter): Query<AssociationFilter>,
) -> Result<Json<Vec<Association>>, AppError> {
    let associations: Vec<Association> =
        fetch_list(state.api.as_ref(), &token, Resource::Associations, &[]).await?;
    Ok(Json(filter.apply(associations)))
}

async fn center_details(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
) -> Result<Json<CenterDetails>, AppError> {
    let details = CatalogService::new(state.api.clone())
        .center_details(&token, id)
        .await?;
    Ok(Json(details))
}

async fn room(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
) -> Result<Json<Room>, AppError> {
    let room = CatalogService::new(state.api.clone()).room(&token, id).await?;
    Ok(Json(room))
}

async fn list_courses(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CatalogService::new(state.api.clone()).courses(&token).await?;
    Ok(Json(courses))
}

async fn course(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    let course = CatalogService::new(state.api.clone()).course(&token, id).await?;
    Ok(Json(course))
}

async fn list_programs(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<Json<Vec<TrainingProgram>>, AppError> {
    let programs = CatalogService::new(state.api.clone()).programs(&token).await?;
    Ok(Json(programs))
}

async fn list_training_courses(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<ProgramParams>,
) -> Result<Json<Vec<TrainingCourse>>, AppError> {
    let courses = CatalogService::new(state.api.clone())
        .training_courses(&token, params.program)
        .await?;
    Ok(Json(courses))
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

fn optional_id(field: &str, raw: &str) -> Result<Option<i64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{} must be a number", field)))
}

async fn import_students(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    MultipartForm(mut multipart): MultipartForm,
) -> Result<Json<Value>, AppError> {
    let mut import = BulkImport::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                import.file_name = field.file_name().unwrap_or_default().to_string();
                import.bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
            }
            "program_id" | "group_id" | "training_course_id" => {
                let value = optional_id(&name, &field.text().await.map_err(multipart_error)?)?;
                match name.as_str() {
                    "program_id" => import.program_id = value,
                    "group_id" => import.group_id = value,
                    _ => import.training_course_id = value,
                }
            }
            _ => {}
        }
    }

    let upload = import.into_upload()?;
    info!("importing students from {} ({} bytes)", upload.file_name, upload.bytes.len());
    let result = state.api.bulk_import_students(&token, upload).await?;
    Ok(Json(result))
}

fn resource(slug: &str) -> Result<Resource, AppError> {
    slug.parse().map_err(|_| AppError::NotFound)
}

async fn list_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(slug): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, AppError> {
    let items = state.api.list(&token, resource(&slug)?, &query).await?;
    Ok(Json(items))
}

async fn create_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let created = state.api.create(&token, resource(&slug)?, &body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<Value>, AppError> {
    let item = state.api.retrieve(&token, resource(&slug)?, id).await?;
    Ok(Json(item))
}

async fn update_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path((slug, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    let item = state.api.update(&token, resource(&slug)?, id, &body).await?;
    Ok(Json(item))
}

async fn replace_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path((slug, id)): Path<(String, i64)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    let item = state.api.replace(&token, resource(&slug)?, id, &body).await?;
    Ok(Json(item))
}

async fn delete_resource(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    let resource = resource(&slug)?;
    state.api.delete(&token, resource, id).await?;
    info!("deleted {} {}", resource, id);
    Ok(StatusCode::NO_CONTENT)
}
