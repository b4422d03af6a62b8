//! Public API surface for the dashboard service.
//!
//! This file consolidates the DTO types shared by the controller and the
//! HTTP layer. All types derive Serialize/Deserialize for JSON serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub use crate::db::RepositoryType;
pub use crate::models::{DateBounds, DateRange, MetricDomain};
pub use crate::services::charts::{ChartConfig, Figure};

use crate::db::RepositoryError;
use crate::models::MetricTable;
use crate::services::charts::compose_chart;

crate::define_counter_type!(u64, RefreshGeneration);

/// Dashboard session identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(SessionId)
    }
}

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    /// Page load, range taken from URL parameters
    Load,
    /// User picked new dates
    RangeChange,
    /// "Update Data" button
    Manual,
    /// Auto-refresh tick
    Timer,
}

/// One rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPanel {
    pub domain: MetricDomain,
    pub title: String,
    pub figure: Figure,
    pub config: ChartConfig,
}

impl ChartPanel {
    pub fn compose(table: &MetricTable) -> Self {
        Self {
            domain: table.domain,
            title: table.domain.title().to_string(),
            figure: compose_chart(table),
            config: ChartConfig::default(),
        }
    }
}

/// Error banner content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardError {
    /// Error class, e.g. `connection` or `authentication`
    pub kind: String,
    pub message: String,
}

impl From<&RepositoryError> for DashboardError {
    fn from(err: &RepositoryError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.message().to_string(),
        }
    }
}

/// A complete dashboard render: six panels, or one error banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardView {
    Ready {
        range: DateRange,
        panels: Vec<ChartPanel>,
        rendered_at: DateTime<Utc>,
    },
    Failed {
        range: DateRange,
        error: DashboardError,
        rendered_at: DateTime<Utc>,
    },
}

impl DashboardView {
    pub fn ready(range: DateRange, panels: Vec<ChartPanel>) -> Self {
        Self::Ready {
            range,
            panels,
            rendered_at: Utc::now(),
        }
    }

    pub fn failed(range: DateRange, error: DashboardError) -> Self {
        Self::Failed {
            range,
            error,
            rendered_at: Utc::now(),
        }
    }

    pub fn range(&self) -> &DateRange {
        match self {
            Self::Ready { range, .. } | Self::Failed { range, .. } => range,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn panels(&self) -> &[ChartPanel] {
        match self {
            Self::Ready { panels, .. } => panels,
            Self::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&DashboardError> {
        match self {
            Self::Ready { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Session state as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub range: DateRange,
    /// Generation of the committed view
    pub generation: RefreshGeneration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<RefreshTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<DashboardView>,
}

/// Static service settings the page needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettingsDto {
    pub backend: RepositoryType,
    pub default_range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<DateBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh_secs: Option<u64>,
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
