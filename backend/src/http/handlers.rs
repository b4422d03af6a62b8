//! HTTP handlers for the dashboard API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! [`DashboardController`](crate::services::DashboardController).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::dto::{
    DashboardSettingsDto, DashboardView, HealthResponse, RangeQuery, RangeRequest, SessionId,
    SessionSnapshot,
};
use super::error::AppError;
use super::page::INDEX_HTML;
use super::state::AppState;
use crate::db::repositories::warehouse::FORWARDED_TOKEN_HEADER;
use crate::db::QueryContext;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// SSE event name for committed dashboard updates.
pub const DASHBOARD_EVENT: &str = "dashboard";

/// Token forwarded by the hosting platform, if the request carries one.
fn forwarded_context(headers: &HeaderMap) -> Option<QueryContext> {
    headers
        .get(FORWARDED_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(QueryContext::with_forwarded_token)
}

fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Session {} not found", raw)))
}

// =============================================================================
// Page & service info
// =============================================================================

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository is reachable.
pub async fn health_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<HealthResponse> {
    let ctx = forwarded_context(&headers).unwrap_or_default();
    let controller = &state.controller;
    let repo_status = match controller.repository().health_check(&ctx).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e.message()),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        backend: controller.repository_type().to_string(),
        repository: repo_status,
        sessions: controller.sessions().len(),
    }))
}

/// GET /v1/config
pub async fn get_config(State(state): State<AppState>) -> HandlerResult<DashboardSettingsDto> {
    Ok(Json(state.settings()))
}

// =============================================================================
// Stateless render
// =============================================================================

/// GET /v1/dashboard?start=&end=
///
/// Render once without a session. A backend failure still returns the view
/// (with its error banner) but with `502 Bad Gateway`.
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RangeQuery>,
) -> Result<(StatusCode, Json<DashboardView>), AppError> {
    let controller = &state.controller;
    let range = controller.resolve_range(query.start.as_deref(), query.end.as_deref())?;
    let ctx = forwarded_context(&headers).unwrap_or_default();
    let view = controller.render(&range, &ctx).await?;

    let status = if view.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(view)))
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /v1/sessions?start=&end=
///
/// Open a session on the requested range and render it once.
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RangeQuery>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let controller = &state.controller;
    let range = controller.resolve_range(query.start.as_deref(), query.end.as_deref())?;
    let ctx = forwarded_context(&headers).unwrap_or_default();
    let snapshot = controller.open_session(range, ctx).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> HandlerResult<SessionSnapshot> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.controller.snapshot(&id)?))
}

/// PUT /v1/sessions/{session_id}/range
///
/// Change the session's range and refresh.
pub async fn set_session_range(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RangeRequest>, JsonRejection>,
) -> HandlerResult<SessionSnapshot> {
    let id = parse_session_id(&session_id)?;
    let Json(request) = body?;
    let controller = &state.controller;
    let range = controller.resolve_range(request.start.as_deref(), request.end.as_deref())?;
    let snapshot = controller
        .set_range(&id, range, forwarded_context(&headers))
        .await?;
    Ok(Json(snapshot))
}

/// POST /v1/sessions/{session_id}/refresh
///
/// Re-render the session's current range ("Update Data").
pub async fn refresh_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult<SessionSnapshot> {
    let id = parse_session_id(&session_id)?;
    let snapshot = state
        .controller
        .refresh(&id, forwarded_context(&headers))
        .await?;
    Ok(Json(snapshot))
}

/// GET /v1/sessions/{session_id}/events
///
/// Stream committed dashboard updates via Server-Sent Events (SSE). The
/// current snapshot is sent first.
pub async fn stream_session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let id = parse_session_id(&session_id)?;
    let mut updates = state.controller.subscribe(&id)?;
    let initial = state.controller.snapshot(&id)?;

    let stream = async_stream::stream! {
        yield Ok(snapshot_event(&initial));
        loop {
            match updates.recv().await {
                Ok(snapshot) => yield Ok(snapshot_event(&snapshot)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session = %id, skipped, "SSE subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn snapshot_event(snapshot: &SessionSnapshot) -> Event {
    Event::default()
        .event(DASHBOARD_EVENT)
        .id(snapshot.generation.to_string())
        .data(serde_json::to_string(snapshot).unwrap_or_default())
}
