//! HTTP admin API
//!
//! A thin JSON surface over the store and the timer engine. Every response
//! carries `"ok"`; mutations push a refreshed projection onto the update
//! bus so connected frontends can re-render.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use roster_api::{DepartureTime, GuildMember, PushEvent, API_VERSION, EMPTY_FIELD};
use roster_core::{NewTimer, TimerEngine, TimerPatch};
use roster_store::JsonStore;
use roster_util::{now_ms, RosterError, TimerId};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub engine: Arc<TimerEngine>,
    pub updates: broadcast::Sender<PushEvent>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        .route(
            "/api/members",
            get(get_members).post(add_member).delete(remove_member),
        )
        .route("/api/prices", post(set_prices))
        .route("/api/times", post(set_times))
        .route("/api/timers", get(get_timers).post(create_timer))
        .route("/api/timers/:id", patch(update_timer).delete(delete_timer))
        .route("/api/timers/:id/start", post(start_timer))
        .route("/api/timers/:id/reset", post(reset_timer))
        .with_state(state)
}

/// API-level errors, mapped onto HTTP status codes.
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Validation(String),
    Internal(String),
}

impl From<RosterError> for ApiError {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::TimerNotFound(_) => ApiError::NotFound(e.to_string()),
            RosterError::ValidationError(_) => ApiError::Validation(e.to_string()),
            RosterError::StorageError(_) | RosterError::Internal(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
            ApiError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", m),
        };
        let body = Json(json!({ "ok": false, "code": code, "error": message }));
        (status, body).into_response()
    }
}

type ApiResult = Result<Json<serde_json::Value>, ApiError>;

impl AppState {
    /// Push the current non-timer projection onto the update bus.
    async fn notify_status(&self) {
        let status = self.store.read(false).await.status();
        let receivers = self.updates.send(PushEvent::Status { status }).unwrap_or(0);
        debug!(receivers, "Status update pushed");
    }

    /// Push a fresh timer snapshot onto the update bus.
    async fn notify_timers(&self) {
        let snapshot = self.engine.snapshot(now_ms()).await;
        let receivers = self.updates.send(PushEvent::Timers { snapshot }).unwrap_or(0);
        debug!(receivers, "Timer update pushed");
    }

    async fn persist(&self, doc: &roster_api::Document) -> Result<(), ApiError> {
        if self.store.save(doc).await {
            Ok(())
        } else {
            Err(ApiError::Internal("failed to persist document".into()))
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cache = state.store.cache_status().await;
    Json(json!({
        "ok": true,
        "apiVersion": API_VERSION,
        "serverTime": now_ms(),
        "cache": {
            "cached": cache.cached,
            "ageMs": cache.age.map(|a| a.as_millis() as u64),
        },
    }))
}

async fn get_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.store.read(false).await.status();
    Json(json!({ "ok": true, "status": status }))
}

async fn get_members(State(state): State<AppState>) -> Json<serde_json::Value> {
    let members = state.store.read(false).await.guild_members;
    Json(json!({ "ok": true, "members": members }))
}

#[derive(Debug, Deserialize)]
struct AddMemberRequest {
    nickname: String,
    job: Option<String>,
}

async fn add_member(
    State(state): State<AppState>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult {
    let nickname = req.nickname.trim().to_string();
    if nickname.is_empty() {
        return Err(ApiError::Validation("nickname must not be blank".into()));
    }

    let mut doc = state.store.read(false).await;
    if doc.guild_members.iter().any(|m| m.nickname == nickname) {
        return Err(ApiError::Validation(format!(
            "member already exists: {nickname}"
        )));
    }

    doc.guild_members.push(GuildMember {
        nickname,
        job: req
            .job
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty())
            .unwrap_or_else(|| EMPTY_FIELD.to_string()),
    });
    state.persist(&doc).await?;
    state.notify_status().await;

    Ok(Json(json!({ "ok": true, "members": doc.guild_members })))
}

#[derive(Debug, Deserialize)]
struct RemoveMemberRequest {
    nickname: String,
}

async fn remove_member(
    State(state): State<AppState>,
    Json(req): Json<RemoveMemberRequest>,
) -> ApiResult {
    let nickname = req.nickname.trim();

    let mut doc = state.store.read(false).await;
    let before = doc.guild_members.len();
    doc.guild_members.retain(|m| m.nickname != nickname);
    if doc.guild_members.len() == before {
        return Err(ApiError::NotFound(format!("member not found: {nickname}")));
    }

    state.persist(&doc).await?;
    state.notify_status().await;

    Ok(Json(json!({ "ok": true, "members": doc.guild_members })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricesPatch {
    first_second: Option<String>,
    third: Option<String>,
    skillbook1: Option<String>,
    skillbook2: Option<String>,
}

async fn set_prices(State(state): State<AppState>, Json(req): Json<PricesPatch>) -> ApiResult {
    let mut doc = state.store.read(false).await;
    if let Some(v) = req.first_second {
        doc.prices.first_second = v;
    }
    if let Some(v) = req.third {
        doc.prices.third = v;
    }
    if let Some(v) = req.skillbook1 {
        doc.prices.skillbook1 = v;
    }
    if let Some(v) = req.skillbook2 {
        doc.prices.skillbook2 = v;
    }

    // Normalization on save repairs over-long entries
    state.persist(&doc).await?;
    let doc = state.store.read(false).await;
    state.notify_status().await;

    Ok(Json(json!({ "ok": true, "prices": doc.prices })))
}

#[derive(Debug, Deserialize)]
struct TimesPatch {
    turn1: Option<DepartureTime>,
    turn2: Option<DepartureTime>,
}

async fn set_times(State(state): State<AppState>, Json(req): Json<TimesPatch>) -> ApiResult {
    for time in [&req.turn1, &req.turn2].into_iter().flatten() {
        if time.hour > 23 || time.minute > 59 {
            return Err(ApiError::Validation(format!(
                "invalid departure time: {:02}:{:02}",
                time.hour, time.minute
            )));
        }
    }

    let mut doc = state.store.read(false).await;
    if let Some(t) = req.turn1 {
        doc.departure_times.turn1 = t;
    }
    if let Some(t) = req.turn2 {
        doc.departure_times.turn2 = t;
    }
    state.persist(&doc).await?;
    state.notify_status().await;

    Ok(Json(
        json!({ "ok": true, "departureTimes": doc.departure_times }),
    ))
}

async fn get_timers(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.snapshot(now_ms()).await;
    Json(json!({
        "ok": true,
        "serverTime": snapshot.server_time,
        "timers": snapshot.timers,
    }))
}

async fn create_timer(State(state): State<AppState>, Json(req): Json<NewTimer>) -> ApiResult {
    let update = state.engine.create(now_ms(), req).await?;
    state.notify_timers().await;
    Ok(Json(json!({ "ok": true, "timer": update.timer })))
}

async fn update_timer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TimerPatch>,
) -> ApiResult {
    let update = state
        .engine
        .update_meta(now_ms(), &TimerId::new(id), req)
        .await?;
    if update.changed {
        state.notify_timers().await;
    }
    Ok(Json(
        json!({ "ok": true, "timer": update.timer, "changed": update.changed }),
    ))
}

async fn start_timer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let update = state.engine.start(now_ms(), &TimerId::new(id)).await?;
    state.notify_timers().await;
    Ok(Json(json!({ "ok": true, "timer": update.timer })))
}

async fn reset_timer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let update = state.engine.reset(now_ms(), &TimerId::new(id)).await?;
    state.notify_timers().await;
    Ok(Json(json!({ "ok": true, "timer": update.timer })))
}

async fn delete_timer(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.engine.delete(&TimerId::new(id)).await?;
    state.notify_timers().await;
    Ok(Json(json!({ "ok": true })))
}
