//! Data Transfer Objects for the HTTP API.
//!
//! Dashboard payloads are re-exported from [`crate::api`]; this module only
//! adds the request shapes and the health response.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    ChartPanel, DashboardError, DashboardSettingsDto, DashboardView, RefreshTrigger, SessionId,
    SessionSnapshot,
};

/// `?start=&end=` query parameters. Missing or blank values fall back to the
/// default range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Body of `PUT /v1/sessions/{id}/range`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeRequest {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Which repository backs the dashboard
    pub backend: String,
    /// Repository connection status
    pub repository: String,
    /// Open dashboard sessions
    pub sessions: usize,
}
