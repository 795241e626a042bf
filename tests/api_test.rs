use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::Router;
use chrono::NaiveDate;
use portal::api::router;
use portal::error::AppError;
use portal::models::{
    AttendanceRecord, Credentials, GroupSchedule, GroupSummary, TokenPair, TrainerSchedule,
    TrainerSummary, User,
};
use portal::state::AppState;
use portal::upstream::{AttendanceQuery, PortalApi, Resource, ScheduleQuery, Upload};
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Default)]
struct FakeApi {
    fail_groups: bool,
    schedule_queries: Mutex<Vec<(i64, ScheduleQuery)>>,
    deleted: Mutex<Vec<(Resource, i64)>>,
    uploads: Mutex<Vec<Upload>>,
    logouts: Mutex<Vec<String>>,
}

fn user_for(token: &str) -> Result<User, AppError> {
    let (id, role) = match token {
        "admin-token" => (1, "admin"),
        "center-token" => (3, "center_supervisor"),
        "orphan-token" => (99, "center_supervisor"),
        "trainer-token" => (7, "trainer"),
        _ => {
            return Err(AppError::upstream(
                401,
                r#"{"detail": "Given token not valid for any token type"}"#,
            ));
        }
    };
    Ok(serde_json::from_value(json!({
        "id": id,
        "email": format!("user{}@entraide.ma", id),
        "first_name": "Test",
        "last_name": "User",
        "role": role,
    }))
    .unwrap())
}

fn sessions() -> Value {
    json!([
        {
            "id": 1, "day": "Monday", "start_time": "08:00:00", "end_time": "10:30:00",
            "training_course_details": {"id": 5, "name": "Couture 1A", "program": {"id": 2, "name": "Couture"}}
        },
        {
            "id": 2, "day": "Monday", "start_time": "09:00:00", "end_time": "10:00:00",
            "training_course_details": {"id": 6, "name": "Info 1A", "program": {"id": 3, "name": "Informatique"}}
        },
        {"id": 3, "day": "Thursday", "start_time": "14:30:00", "end_time": "16:30:00"},
        {"id": 4, "day": "Thursday", "start_time": "08:00:00", "end_time": "10:30:00", "is_active": false}
    ])
}

#[async_trait]
impl PortalApi for FakeApi {
    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, AppError> {
        if credentials.email == "trainer@entraide.ma" && credentials.password == "secret" {
            Ok(TokenPair {
                access: "trainer-token".to_string(),
                refresh: "trainer-refresh".to_string(),
            })
        } else {
            Err(AppError::upstream(
                401,
                r#"{"detail": "No active account found with the given credentials"}"#,
            ))
        }
    }

    async fn current_user(&self, token: &str) -> Result<User, AppError> {
        user_for(token)
    }

    async fn logout(&self, refresh: &str) -> Result<(), AppError> {
        self.logouts.lock().unwrap().push(refresh.to_string());
        Err(AppError::upstream(400, r#"{"detail": "Token is blacklisted"}"#))
    }

    async fn list(
        &self,
        token: &str,
        resource: Resource,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, AppError> {
        user_for(token)?;
        let items = match resource {
            Resource::Centers => json!([
                {"id": 10, "name": "Centre Anfa", "city": "Casablanca", "supervisor": 3, "is_active": true},
                {"id": 11, "name": "Centre Agdal", "city": "Rabat", "supervisor": 4, "is_active": false}
            ]),
            Resource::Trainers => json!([
                {"id": 1, "user": {"first_name": "Samira", "last_name": "Alaoui", "email": "samira@entraide.ma"},
                 "center": "Centre Anfa", "program_name": "Couture", "contarct_with": "entraide"},
                {"id": 2, "user": {"first_name": "Youssef", "last_name": "Idrissi", "email": "youssef@entraide.ma", "is_active": false},
                 "center": "Centre Agdal", "program_name": "Informatique", "contarct_with": "association"}
            ]),
            Resource::Students => json!([
                {"id": 30, "exam_id": "EX-030", "user": "Hind Berrada - EX-030",
                 "center": "Centre Anfa", "program": "Couture", "group": null},
                {"id": 31, "exam_id": "EX-031", "user": "Omar Tazi - EX-031",
                 "center": "Centre Anfa", "program": "Cuisine", "group": "G2"}
            ]),
            Resource::Courses => json!([
                {"id": 2, "name": "Informatique", "order": 2},
                {"id": 1, "name": "Couture", "order": 1}
            ]),
            _ => json!([{"resource": resource.slug(), "query": query}]),
        };
        Ok(serde_json::from_value(items).unwrap())
    }

    async fn retrieve(&self, token: &str, resource: Resource, id: i64) -> Result<Value, AppError> {
        user_for(token)?;
        if id == 404 {
            return Err(AppError::upstream(404, r#"{"detail": "Not found."}"#));
        }
        Ok(match resource {
            Resource::Centers => json!({"id": id, "name": "Centre Anfa", "city": "Casablanca"}),
            Resource::Courses => json!({
                "id": id,
                "name": "Couture",
                "units": [
                    {"id": 2, "name": "Finitions", "order": 2},
                    {"id": 1, "name": "Bases", "order": 1}
                ]
            }),
            _ => json!({"id": id, "resource": resource.slug()}),
        })
    }

    async fn create(&self, token: &str, _resource: Resource, body: &Value) -> Result<Value, AppError> {
        user_for(token)?;
        if body.get("name").and_then(Value::as_str).is_none_or(str::is_empty) {
            return Err(AppError::upstream(
                400,
                r#"{"name": ["This field is required."], "city": ["Invalid city.", "Too short."]}"#,
            ));
        }
        let mut created = body.clone();
        created["id"] = json!(42);
        Ok(created)
    }

    async fn update(&self, token: &str, _resource: Resource, id: i64, body: &Value) -> Result<Value, AppError> {
        user_for(token)?;
        let mut updated = body.clone();
        updated["id"] = json!(id);
        updated["partial"] = json!(true);
        Ok(updated)
    }

    async fn replace(&self, token: &str, _resource: Resource, id: i64, body: &Value) -> Result<Value, AppError> {
        user_for(token)?;
        let mut replaced = body.clone();
        replaced["id"] = json!(id);
        Ok(replaced)
    }

    async fn delete(&self, token: &str, resource: Resource, id: i64) -> Result<(), AppError> {
        user_for(token)?;
        self.deleted.lock().unwrap().push((resource, id));
        Ok(())
    }

    async fn bulk_import_students(&self, token: &str, upload: Upload) -> Result<Value, AppError> {
        user_for(token)?;
        self.uploads.lock().unwrap().push(upload);
        Ok(json!({"created": 2, "errors": []}))
    }

    async fn trainer_schedule(
        &self,
        token: &str,
        trainer_id: i64,
        query: &ScheduleQuery,
    ) -> Result<TrainerSchedule, AppError> {
        user_for(token)?;
        self.schedule_queries
            .lock()
            .unwrap()
            .push((trainer_id, query.clone()));
        Ok(serde_json::from_value(json!({
            "trainer": {"id": trainer_id, "first_name": "Samira", "last_name": "Alaoui", "email": "samira@entraide.ma"},
            "schedules": sessions(),
        }))
        .unwrap())
    }

    async fn group_schedule(
        &self,
        token: &str,
        group_id: i64,
        _query: &ScheduleQuery,
    ) -> Result<GroupSchedule, AppError> {
        user_for(token)?;
        Ok(serde_json::from_value(json!({
            "group": {"id": group_id, "name": "G1"},
            "schedules": sessions(),
        }))
        .unwrap())
    }

    async fn trainers_by_center(
        &self,
        _token: &str,
        _center_id: i64,
        _academic_year: Option<&str>,
    ) -> Result<Vec<TrainerSummary>, AppError> {
        Ok(serde_json::from_value(json!([
            {"id": 1, "first_name": "Samira", "last_name": "Alaoui", "email": "samira@entraide.ma"}
        ]))
        .unwrap())
    }

    async fn groups_by_center(
        &self,
        _token: &str,
        center_id: i64,
        _academic_year: Option<&str>,
    ) -> Result<Vec<GroupSummary>, AppError> {
        if self.fail_groups {
            return Err(AppError::upstream(500, "boom"));
        }
        Ok(vec![
            GroupSummary {
                id: 20,
                name: "G1".to_string(),
                description: None,
                center: Some(center_id),
            },
            GroupSummary {
                id: 21,
                name: "G2".to_string(),
                description: None,
                center: Some(center_id),
            },
        ])
    }

    async fn attendance_records(
        &self,
        token: &str,
        _query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        user_for(token)?;
        Ok(serde_json::from_value(json!([
            {"id": 1, "date": "2025-03-03", "status": "present", "student": 30,
             "student_details": {"id": 30, "user": "Hind Berrada - EX-030", "exam_id": "EX-030",
                                 "center": "Centre Anfa", "program": "Couture", "group": null}},
            {"id": 2, "date": "2025-03-03", "status": "late"},
            {"id": 3, "date": "2025-03-04", "status": "absent"}
        ]))
        .unwrap())
    }

    async fn attendance_by_session(
        &self,
        token: &str,
        session_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        user_for(token)?;
        Ok(serde_json::from_value(json!([
            {"id": 9, "date": date, "status": "present", "session_template": session_id}
        ]))
        .unwrap())
    }
}

fn app(api: Arc<FakeApi>) -> Router {
    router(AppState::new(api))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_needs_no_token() {
    let (status, _) = send(
        app(Arc::new(FakeApi::default())),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let request = Request::builder()
        .uri("/trainers")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(Arc::new(FakeApi::default())), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn rejected_extractors_answer_with_json_errors() {
    let requests = vec![
        get("/centers/abc", "admin-token"),
        get("/trainers?status=", "admin-token"),
        get("/attendance/day?date=03-03-2025", "trainer-token"),
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/students/import")
            .header(header::AUTHORIZATION, "Bearer admin-token")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("not a form"))
            .unwrap(),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let (status, body) = send(app(Arc::new(FakeApi::default())), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "400 Bad Request", "{}", uri);
        assert!(!body["message"].as_str().unwrap().is_empty(), "{}", uri);
    }
}

#[tokio::test]
async fn login_returns_tokens_and_dashboard() {
    let request = with_json(
        "POST",
        "/auth/login",
        None,
        json!({"email": "trainer@entraide.ma", "password": "secret"}),
    );
    let (status, body) = send(app(Arc::new(FakeApi::default())), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access"], "trainer-token");
    assert_eq!(body["refresh"], "trainer-refresh");
    assert_eq!(body["dashboard"], "/trainer/dashboard");
    assert_eq!(body["user"]["id"], 7);
}

#[tokio::test]
async fn login_failure_surfaces_backend_detail() {
    let request = with_json(
        "POST",
        "/auth/login",
        None,
        json!({"email": "trainer@entraide.ma", "password": "wrong"}),
    );
    let (status, body) = send(app(Arc::new(FakeApi::default())), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No active account found with the given credentials");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let request = with_json(
        "POST",
        "/auth/login",
        None,
        json!({"email": "", "password": "secret"}),
    );
    let (status, _) = send(app(Arc::new(FakeApi::default())), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_succeeds_even_when_backend_refuses() {
    let api = Arc::new(FakeApi::default());
    let request = with_json("POST", "/auth/logout", None, json!({"refresh": "old-refresh"}));
    let (status, _) = send(app(api.clone()), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(*api.logouts.lock().unwrap(), vec!["old-refresh".to_string()]);
}

#[tokio::test]
async fn me_with_bad_token_passes_through_401() {
    let (status, body) = send(app(Arc::new(FakeApi::default())), get("/auth/me", "stale")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Given token not valid for any token type");
}

#[tokio::test]
async fn trainer_timetable_places_sessions_and_reports_conflicts() {
    let api = Arc::new(FakeApi::default());
    let (status, body) = send(
        app(api.clone()),
        get("/schedule/trainers/5/timetable?academic_year=2024-2025", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["academic_year"], "2024-2025");
    assert_eq!(body["academic_years"].as_array().unwrap().len(), 3);
    assert_eq!(body["programs"], json!(["Couture", "Informatique"]));

    let timetable = &body["timetable"];
    assert_eq!(timetable["slots"][0], "08:00 - 10:30");
    let monday = &timetable["days"][0];
    assert_eq!(monday["day"], "Monday");
    assert_eq!(monday["cells"][0]["session"]["id"], 2);
    assert_eq!(timetable["conflicts"][0]["hidden_session"], 1);
    let thursday = &timetable["days"][3];
    assert_eq!(thursday["cells"][0]["is_empty"], true);
    assert_eq!(thursday["cells"][3]["session"]["id"], 3);

    let queries = api.schedule_queries.lock().unwrap();
    assert_eq!(queries[0].0, 5);
    assert_eq!(queries[0].1.academic_year.as_deref(), Some("2024-2025"));
}

#[tokio::test]
async fn own_timetable_uses_current_user_and_default_year() {
    let api = Arc::new(FakeApi::default());
    let (status, body) = send(
        app(api.clone()),
        get("/schedule/trainers/me/timetable", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trainer"]["id"], 7);

    let queries = api.schedule_queries.lock().unwrap();
    assert_eq!(queries[0].0, 7);
    assert!(queries[0].1.academic_year.is_some());
}

#[tokio::test]
async fn own_timetable_is_for_trainers_only() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/schedule/trainers/me/timetable", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");
}

#[tokio::test]
async fn group_timetable_skips_inactive_sessions() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/schedule/groups/20/timetable", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"]["name"], "G1");
    assert_eq!(body["timetable"]["days"][3]["cells"][0]["is_empty"], true);
}

#[tokio::test]
async fn center_overview_for_supervisor() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/centers/mine/overview?academic_year=2024-2025", "center-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["center"]["id"], 10);
    assert_eq!(body["academic_year"], "2024-2025");
    assert_eq!(body["trainers"].as_array().unwrap().len(), 1);
    assert_eq!(body["groups"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn center_overview_rejects_other_roles_and_unassigned() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/centers/mine/overview", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/centers/mine/overview", "orphan-token"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "No center assigned");
}

#[tokio::test]
async fn center_overview_fails_when_either_fetch_fails() {
    let api = Arc::new(FakeApi {
        fail_groups: true,
        ..Default::default()
    });
    let (status, body) = send(app(api), get("/centers/mine/overview", "center-token")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Server error");
}

#[tokio::test]
async fn trainer_filters_apply_to_listing() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/trainers?search=INFO&status=inactive", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let trainers = body.as_array().unwrap();
    assert_eq!(trainers.len(), 1);
    assert_eq!(trainers[0]["id"], 2);

    let (_, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/centers?city=rabat", "admin-token"),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Centre Agdal");
}

#[tokio::test]
async fn attendance_stats_and_validation() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/stats?start_date=2025-03-01&end_date=2025-03-31", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_sessions"], 3);
    assert_eq!(body["stats"]["attendance_rate"], 66.67);
    assert_eq!(body["daily"][0]["date"], "2025-03-03");
    assert_eq!(body["daily"][0]["total"], 2);

    let (status, _) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/stats?start_date=2025-03-31&end_date=2025-03-01", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attendance_day_for_trainer() {
    // 2025-03-03 is a Monday
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/day?date=2025-03-03", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weekday"], "Monday");
    let ids: Vec<i64> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(body["stats"]["late_count"], 1);
}

#[tokio::test]
async fn attendance_day_search_narrows_records() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/day?date=2025-03-03&search=nothing-matches", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["records"].as_array().unwrap().is_empty());
    assert_eq!(body["stats"]["total_sessions"], 3);
}

#[tokio::test]
async fn attendance_day_records_carry_student_names() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/day?date=2025-03-03", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"][0]["student"], 30);
    assert_eq!(body["records"][0]["student_details"]["user"], "Hind Berrada - EX-030");
    assert_eq!(body["records"][0]["student_details"]["exam_id"], "EX-030");

    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/day?date=2025-03-03&search=hind", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 1);
}

#[tokio::test]
async fn student_listing_decodes_user_labels() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/students?search=berrada", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let students = body.as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["user"], "Hind Berrada - EX-030");
    assert_eq!(students[0]["program"], "Couture");

    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/students?group=G2", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["exam_id"], "EX-031");
}

#[tokio::test]
async fn attendance_month_covers_every_day() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/month?year=2025&month=3", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let days = body.as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[2]["date"], "2025-03-03");
    assert_eq!(days[2]["total"], 2);
    assert_eq!(days[0]["total"], 0);

    let (status, _) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/month?year=2025&month=13", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trainer_week_dates_sessions() {
    // 2025-03-05 is a Wednesday
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/schedule/trainers/me/week?date=2025-03-05", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["week_start"], "2025-03-03");
    assert_eq!(
        body["occurrences"],
        json!([
            {"session_id": 1, "date": "2025-03-03"},
            {"session_id": 2, "date": "2025-03-03"},
            {"session_id": 3, "date": "2025-03-06"}
        ])
    );
}

#[tokio::test]
async fn session_attendance_passes_date() {
    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/attendance/sessions/3?date=2025-03-06", "trainer-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["date"], "2025-03-06");
    assert_eq!(body[0]["session_template"], 3);
}

#[tokio::test]
async fn resource_crud_passthrough() {
    let api = Arc::new(FakeApi::default());

    let (status, body) = send(
        app(api.clone()),
        get("/resources/training-programs?page_size=50", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["resource"], "training-programs");
    assert_eq!(body[0]["query"], json!([["page_size", "50"]]));

    let (status, body) = send(
        app(api.clone()),
        with_json("POST", "/resources/centers", Some("admin-token"), json!({"name": "Centre Hay Hassani"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 42);

    let (status, body) = send(
        app(api.clone()),
        with_json("PATCH", "/resources/centers/42", Some("admin-token"), json!({"city": "Casablanca"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partial"], true);

    let (status, _) = send(
        app(api.clone()),
        Request::builder()
            .method("DELETE")
            .uri("/resources/rooms/8")
            .header(header::AUTHORIZATION, "Bearer admin-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(*api.deleted.lock().unwrap(), vec![(Resource::Rooms, 8)]);
}

#[tokio::test]
async fn resource_errors() {
    let (status, _) = send(
        app(Arc::new(FakeApi::default())),
        get("/resources/spaceships", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        get("/resources/courses/404", "admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found.");

    let (status, body) = send(
        app(Arc::new(FakeApi::default())),
        with_json("POST", "/resources/centers", Some("admin-token"), json!({"name": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "name: This field is required. city: Invalid city., Too short."
    );
}

#[tokio::test]
async fn center_details_bundle_rosters() {
    let (status, body) = send(app(Arc::new(FakeApi::default())), get("/centers/10", "admin-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["center"]["name"], "Centre Anfa");
    assert_eq!(body["students"][0]["exam_id"], "EX-030");
    assert_eq!(body["trainers"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn courses_come_back_ordered() {
    let (status, body) = send(app(Arc::new(FakeApi::default())), get("/courses", "admin-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Couture");

    let (status, body) = send(app(Arc::new(FakeApi::default())), get("/courses/1", "admin-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["units"][0]["name"], "Bases");
}

fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let boundary = "portal-test-boundary";
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/students/import")
        .header(header::AUTHORIZATION, "Bearer admin-token")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn bulk_import_forwards_valid_spreadsheet() {
    let api = Arc::new(FakeApi::default());
    let request = multipart(&[
        ("file", Some("etudiants.xlsx"), "PK fake sheet"),
        ("program_id", None, "2"),
        ("group_id", None, ""),
    ]);
    let (status, body) = send(app(api.clone()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 2);

    let uploads = api.uploads.lock().unwrap();
    assert_eq!(uploads[0].file_name, "etudiants.xlsx");
    assert_eq!(uploads[0].bytes, b"PK fake sheet");
    assert_eq!(
        uploads[0].fields,
        vec![("program_id".to_string(), "2".to_string())]
    );
}

#[tokio::test]
async fn bulk_import_rejects_before_forwarding() {
    let api = Arc::new(FakeApi::default());

    let (status, _) = send(
        app(api.clone()),
        multipart(&[("file", Some("etudiants.csv"), "a,b"), ("program_id", None, "2")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app(api.clone()),
        multipart(&[("file", Some("etudiants.xls"), "sheet")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A program must be selected");

    assert!(api.uploads.lock().unwrap().is_empty());
}
