//! Application state for the HTTP server.

use std::sync::Arc;

use crate::api::DashboardSettingsDto;
use crate::models::DateBounds;
use crate::services::DashboardController;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DashboardController>,
    /// Supported window, when the backend enforces one
    pub bounds: Option<DateBounds>,
}

impl AppState {
    pub fn new(controller: Arc<DashboardController>) -> Self {
        Self {
            controller,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: DateBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn settings(&self) -> DashboardSettingsDto {
        DashboardSettingsDto {
            backend: self.controller.repository_type(),
            default_range: self.controller.default_range(),
            bounds: self.bounds,
            auto_refresh_secs: self.controller.auto_refresh().map(|d| d.as_secs()),
        }
    }
}
