use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    Course, ScheduleError, Section, Timetable,
    session::{RawSession, SESSION_LIST_KEYS, ingest_sessions},
};

#[derive(Clone)]
pub struct AppState {
    timetable: Arc<RwLock<Timetable>>,
}

impl AppState {
    pub fn new(timetable: Timetable) -> Self {
        Self {
            timetable: Arc::new(RwLock::new(timetable)),
        }
    }

    pub fn with_shared(timetable: Arc<RwLock<Timetable>>) -> Self {
        Self { timetable }
    }

    fn timetable(&self) -> Arc<RwLock<Timetable>> {
        self.timetable.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            err if err.is_not_found() => ApiError::NotFound(err.to_string()),
            err @ ScheduleError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            err => ApiError::Invalid(err.to_string()),
        }
    }
}

impl From<polars::prelude::PolarsError> for ApiError {
    fn from(value: polars::prelude::PolarsError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        let body = Json(ErrorBody {
            success: false,
            error,
            message,
        });
        (status, body).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn ok(body: Value) -> Json<Value> {
    let mut envelope = json!({ "success": true });
    if let (Value::Object(target), Value::Object(fields)) = (&mut envelope, body) {
        target.extend(fields);
    }
    Json(envelope)
}

#[derive(Debug, Deserialize)]
struct CohortQuery {
    level: u32,
    group: u32,
    #[serde(default)]
    published: bool,
}

#[derive(Debug, Deserialize)]
struct PublishedQuery {
    #[serde(default)]
    published: bool,
}

#[derive(Debug, Deserialize)]
struct CreateSchedulePayload {
    level: u32,
    group: u32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateGroupsPayload {
    count: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendar", get(get_calendar))
        .route("/courses", get(list_courses).post(upsert_course))
        .route("/courses/:code", delete(delete_course))
        .route("/sections", get(list_sections).post(upsert_section))
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route("/schedules/:id/publish", post(publish_schedule))
        .route("/schedules/:id/generate", post(generate_schedule))
        .route("/groups/:level", get(list_groups).post(create_groups))
        .route("/groups/:level/:group", delete(delete_group))
        .route("/sessions", get(list_sessions).post(create_sessions))
        .route("/sessions/:id", delete(delete_session))
        .route("/sessions/course/:code", delete(delete_course_sessions))
        .route("/sessions/group/:level/:group", delete(delete_group_sessions))
        .route("/grid/:level/:group", get(get_grid))
        .route("/conflicts", get(list_conflicts))
        .route("/teaching_load", get(teaching_load))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, timetable: Timetable) -> std::io::Result<()> {
    let state = AppState::new(timetable);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "smart-schedule HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "status": "ok" }))
}

async fn get_calendar(State(state): State<AppState>) -> Json<Value> {
    let timetable = state.timetable();
    let guard = timetable.read();
    let calendar = guard.calendar();
    ok(json!({
        "calendar": calendar.to_config(),
        "rendering_slots": calendar.rendering_slots(),
    }))
}

async fn list_courses(State(state): State<AppState>) -> Json<Value> {
    let timetable = state.timetable();
    let courses = timetable.read().catalog().courses().to_vec();
    ok(json!({ "courses": courses }))
}

async fn upsert_course(
    State(state): State<AppState>,
    Json(course): Json<Course>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if course.course_code.trim().is_empty() {
        return Err(ApiError::invalid("course_code must not be empty"));
    }
    let timetable = state.timetable();
    timetable.write().upsert_course(course.clone());
    Ok((StatusCode::CREATED, ok(json!({ "course": course }))))
}

async fn delete_course(State(state): State<AppState>, Path(code): Path<String>) -> ApiResult {
    let timetable = state.timetable();
    let removed = timetable.write().remove_course(&code);
    match removed {
        Some((course, sessions)) => Ok(ok(json!({
            "course": course,
            "deleted_sessions": sessions,
        }))),
        None => Err(ApiError::NotFound(format!("course {code} not found"))),
    }
}

async fn list_sections(State(state): State<AppState>) -> Json<Value> {
    let timetable = state.timetable();
    let sections = timetable.read().catalog().sections().to_vec();
    ok(json!({ "sections": sections }))
}

async fn upsert_section(
    State(state): State<AppState>,
    Json(section): Json<Section>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if section.section_num == 0 {
        return Err(ApiError::invalid("section_num must be positive"));
    }
    let timetable = state.timetable();
    timetable.write().upsert_section(section);
    Ok((StatusCode::CREATED, ok(json!({ "section": section }))))
}

async fn list_schedules(State(state): State<AppState>) -> Json<Value> {
    let timetable = state.timetable();
    let schedules = timetable.read().schedules().to_vec();
    ok(json!({ "schedules": schedules }))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let timetable = state.timetable();
    let record = {
        let mut guard = timetable.write();
        let id = guard.create_schedule(payload.level, payload.group, payload.name)?;
        guard
            .find_schedule(id)
            .cloned()
            .ok_or_else(|| ApiError::Internal("schedule not found after creation".into()))?
    };
    Ok((StatusCode::CREATED, ok(json!({ "schedule": record }))))
}

async fn publish_schedule(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let timetable = state.timetable();
    timetable.write().publish(id)?;
    Ok(ok(json!({ "schedule_id": id, "published": true })))
}

async fn generate_schedule(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let timetable = state.timetable();
    let summary = timetable.write().generate(id)?;
    Ok(ok(json!({ "summary": summary })))
}

async fn list_groups(State(state): State<AppState>, Path(level): Path<u32>) -> Json<Value> {
    let timetable = state.timetable();
    let groups = timetable.read().groups(level);
    ok(json!({ "level": level, "groups": groups }))
}

async fn create_groups(
    State(state): State<AppState>,
    Path(level): Path<u32>,
    Json(payload): Json<CreateGroupsPayload>,
) -> ApiResult {
    let timetable = state.timetable();
    let groups = timetable.write().create_groups(level, payload.count)?;
    Ok(ok(json!({ "level": level, "groups": groups })))
}

async fn delete_group(
    State(state): State<AppState>,
    Path((level, group)): Path<(u32, u32)>,
) -> ApiResult {
    let timetable = state.timetable();
    let removed = timetable.write().delete_group(level, group)?;
    Ok(ok(json!({ "deleted_sessions": removed })))
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<CohortQuery>,
) -> Json<Value> {
    let timetable = state.timetable();
    let guard = timetable.read();
    let sessions = if query.published {
        guard.published_sessions_for(query.level, query.group)
    } else {
        guard.sessions_for(query.level, query.group)
    };
    ok(json!({ "sessions": sessions }))
}

/// Accepts a single session object, an array, or a `{sessions|schedule|data: [...]}` envelope.
async fn create_sessions(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let sessions = match &payload {
        Value::Object(map) if !is_session_envelope(map) => {
            vec![RawSession::from_map(map)?.normalize()?]
        }
        _ => ingest_sessions(&payload)?,
    };

    let timetable = state.timetable();
    let ids = {
        let mut guard = timetable.write();
        let mut staged = guard.clone();
        let mut ids = Vec::with_capacity(sessions.len());
        for session in sessions {
            ids.push(staged.add_session(session)?);
        }
        *guard = staged;
        ids
    };
    info!(count = ids.len(), "created sessions");
    Ok((StatusCode::CREATED, ok(json!({ "ids": ids }))))
}

fn is_session_envelope(map: &serde_json::Map<String, Value>) -> bool {
    SESSION_LIST_KEYS
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_array))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let timetable = state.timetable();
    let removed = timetable.write().delete_session(id)?;
    Ok(ok(json!({ "session": removed })))
}

async fn delete_course_sessions(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<Value> {
    let timetable = state.timetable();
    let removed = timetable.write().delete_course_sessions(&code);
    ok(json!({ "deleted_sessions": removed }))
}

async fn delete_group_sessions(
    State(state): State<AppState>,
    Path((level, group)): Path<(u32, u32)>,
) -> Json<Value> {
    let timetable = state.timetable();
    let removed = timetable.write().delete_group_sessions(level, group);
    ok(json!({ "deleted_sessions": removed }))
}

async fn get_grid(
    State(state): State<AppState>,
    Path((level, group)): Path<(u32, u32)>,
    Query(query): Query<PublishedQuery>,
) -> ApiResult {
    let timetable = state.timetable();
    let grid = {
        let guard = timetable.read();
        if query.published {
            guard.render_published_grid(level, group)?
        } else {
            guard.render_grid(level, group)?
        }
    };
    Ok(ok(json!({ "level": level, "group": group, "grid": grid })))
}

async fn list_conflicts(State(state): State<AppState>) -> Json<Value> {
    let timetable = state.timetable();
    let conflicts = timetable.read().conflicts();
    ok(json!({ "count": conflicts.len(), "conflicts": conflicts }))
}

async fn teaching_load(State(state): State<AppState>) -> ApiResult {
    let timetable = state.timetable();
    let df = timetable.read().teaching_load()?;
    let instructors = df.column("instructor")?.str()?;
    let sessions = df.column("sessions")?.u32()?;
    let minutes = df.column("minutes")?.u32()?;
    let rows: Vec<Value> = (0..df.height())
        .map(|idx| {
            json!({
                "instructor": instructors.get(idx),
                "sessions": sessions.get(idx),
                "minutes": minutes.get(idx),
            })
        })
        .collect();
    Ok(ok(json!({ "teaching_load": rows })))
}
