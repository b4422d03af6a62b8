//! End-to-end tests for the HTTP API, driven through the router with `oneshot`.
#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fuel_dashboard::api::RefreshTrigger;
use fuel_dashboard::db::{
    LocalRepository, MetricRepository, QueryContext, RepositoryResult, RepositoryType,
    SyntheticRepository,
};
use fuel_dashboard::http::{create_router, AppState};
use fuel_dashboard::models::{
    DashboardTables, DateBounds, DateRange, MetricDomain, MetricTable,
};
use fuel_dashboard::services::{DashboardController, SyntheticGenerator};

const TOKEN_HEADER: &str = "x-forwarded-access-token";

/// Returns empty tables and remembers the token each render arrived with.
#[derive(Default)]
struct RecordingRepository {
    tokens: parking_lot::Mutex<Vec<Option<String>>>,
}

impl RecordingRepository {
    fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().clone()
    }
}

#[async_trait]
impl MetricRepository for RecordingRepository {
    fn repository_type(&self) -> RepositoryType {
        RepositoryType::Warehouse
    }

    async fn health_check(&self, _ctx: &QueryContext) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn fetch_table(
        &self,
        domain: MetricDomain,
        _range: &DateRange,
        _ctx: &QueryContext,
    ) -> RepositoryResult<MetricTable> {
        Ok(MetricTable::empty(domain))
    }

    async fn fetch_all(
        &self,
        _range: &DateRange,
        ctx: &QueryContext,
    ) -> RepositoryResult<DashboardTables> {
        self.tokens
            .lock()
            .push(ctx.forwarded_token().map(str::to_string));
        Ok(DashboardTables::from_tables(
            MetricDomain::ALL.into_iter().map(MetricTable::empty),
        ))
    }
}

fn synthetic_app() -> Router {
    let bounds = DateBounds::default();
    let repo = SyntheticRepository::new(SyntheticGenerator::with_seed(7), bounds);
    app_with(Arc::new(repo), Some(bounds))
}

fn app_with(repo: Arc<dyn MetricRepository>, bounds: Option<DateBounds>) -> Router {
    let controller = DashboardController::new(repo, support::first_week());
    let mut state = AppState::new(Arc::new(controller));
    if let Some(bounds) = bounds {
        state = state.with_bounds(bounds);
    }
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_token(app, method, uri, body, None).await
}

async fn send_with_token(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = synthetic_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "synthetic");
    assert_eq!(body["repository"], "connected");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_config_exposes_bounds_and_default_range() {
    let app = synthetic_app();
    let (status, body) = send(&app, Method::GET, "/v1/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "synthetic");
    assert_eq!(body["default_range"]["start"], "2024-01-01");
    assert_eq!(body["default_range"]["end"], "2024-01-07");
    assert_eq!(body["bounds"]["earliest"], "2024-01-01");
    assert_eq!(body["bounds"]["latest"], "2025-05-31");
}

#[tokio::test]
async fn test_stateless_render_returns_six_panels() {
    let app = synthetic_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/dashboard?start=2024-02-01&end=2024-02-10",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["range"]["start"], "2024-02-01");
    let panels = body["panels"].as_array().unwrap();
    assert_eq!(panels.len(), 6);
    assert_eq!(panels[0]["domain"], "gallons");
    assert_eq!(panels[4]["figure"]["data"][0]["type"], "bar");
}

#[tokio::test]
async fn test_stateless_render_rejects_inverted_range() {
    let app = synthetic_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/dashboard?start=2024-03-10&end=2024-03-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stateless_render_rejects_range_outside_bounds() {
    let app = synthetic_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/dashboard?start=2023-12-25&end=2024-01-03",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_stateless_render_rejects_garbage_dates() {
    let app = synthetic_app();
    let (status, body) = send(&app, Method::GET, "/v1/dashboard?start=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("yesterday"));
}

#[tokio::test]
async fn test_failed_backend_yields_bad_gateway_with_banner() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    let app = app_with(Arc::new(repo), None);

    let (status, body) = send(&app, Method::GET, "/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"]["kind"], "connection");
    assert!(body.get("panels").is_none());
}

#[tokio::test]
async fn test_local_backend_has_no_bounds_in_config() {
    let app = app_with(Arc::new(LocalRepository::new()), None);
    let (status, body) = send(&app, Method::GET, "/v1/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "local");
    assert!(body.get("bounds").is_none());
}

#[tokio::test]
async fn test_session_flow() {
    let app = synthetic_app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/sessions?start=2024-01-01&end=2024-01-07",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["generation"], 1);
    assert_eq!(created["trigger"], "load");
    assert_eq!(created["view"]["status"], "ready");
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, changed) = send(
        &app,
        Method::PUT,
        &format!("/v1/sessions/{}/range", id),
        Some(json!({"start": "2024-03-01", "end": "2024-03-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(changed["generation"], 2);
    assert_eq!(changed["trigger"], "range_change");
    assert_eq!(changed["range"]["end"], "2024-03-31");

    let (status, refreshed) =
        send(&app, Method::POST, &format!("/v1/sessions/{}/refresh", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["generation"], 3);
    assert_eq!(refreshed["trigger"], "manual");
    assert_eq!(refreshed["range"]["start"], "2024-03-01");

    let (status, fetched) = send(&app, Method::GET, &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["generation"], 3);

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["sessions"], 1);
}

#[tokio::test]
async fn test_invalid_range_update_keeps_session_state() {
    let app = synthetic_app();
    let (_, created) = send(&app, Method::POST, "/v1/sessions", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/v1/sessions/{}/range", id),
        Some(json!({"start": "2024-05-10", "end": "2024-05-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, fetched) = send(&app, Method::GET, &format!("/v1/sessions/{}", id), None).await;
    assert_eq!(fetched["generation"], 1);
    assert_eq!(fetched["range"]["start"], "2024-01-01");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = synthetic_app();
    let (_, created) = send(&app, Method::POST, "/v1/sessions", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/v1/sessions/{}/range", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = synthetic_app();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(&app, Method::GET, &format!("/v1/sessions/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/sessions/{}/refresh", missing),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/v1/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_opens_for_known_session() {
    let app = synthetic_app();
    let (_, created) = send(&app, Method::POST, "/v1/sessions", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let request = Request::get(format!("/v1/sessions/{}/events", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_forwarded_token_reaches_repository() {
    let repo = Arc::new(RecordingRepository::default());
    let controller = Arc::new(DashboardController::new(repo.clone(), support::first_week()));
    let app = create_router(AppState::new(controller.clone()));

    let (status, created) =
        send_with_token(&app, Method::POST, "/v1/sessions", None, Some("user-token-1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(repo.tokens(), vec![Some("user-token-1".to_string())]);

    // Timer refreshes carry no request; they reuse the session's token.
    assert_eq!(controller.refresh_all(RefreshTrigger::Timer).await, 1);
    assert_eq!(repo.tokens()[1].as_deref(), Some("user-token-1"));

    // A later user request replaces it.
    let id = created["session_id"].as_str().unwrap().to_string();
    let (status, _) = send_with_token(
        &app,
        Method::POST,
        &format!("/v1/sessions/{}/refresh", id),
        None,
        Some("user-token-2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    controller.refresh_all(RefreshTrigger::Timer).await;
    let tokens = repo.tokens();
    assert_eq!(tokens[2].as_deref(), Some("user-token-2"));
    assert_eq!(tokens[3].as_deref(), Some("user-token-2"));
}

#[tokio::test]
async fn test_blank_or_missing_forwarded_token_is_none() {
    let repo = Arc::new(RecordingRepository::default());
    let controller = Arc::new(DashboardController::new(repo.clone(), support::first_week()));
    let app = create_router(AppState::new(controller));

    let (status, _) = send_with_token(&app, Method::GET, "/v1/dashboard", None, Some("   ")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(repo.tokens(), vec![None, None]);
}
