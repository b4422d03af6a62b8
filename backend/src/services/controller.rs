//! Dashboard controller.
//!
//! Turns triggers (page load, range change, manual refresh, timer tick) into
//! rendered dashboards. A render fetches all six tables from the repository,
//! composes six charts and produces one [`DashboardView`]: either every panel
//! or a single error banner, never a mix.
//!
//! Invalid input is returned as [`ControllerError::Validation`] before any
//! data is generated or queried. Backend failures are not errors here; they
//! become a failed view so the page can show the banner.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{
    ChartPanel, DashboardError, DashboardView, RefreshTrigger, SessionId, SessionSnapshot,
};
use crate::db::{MetricRepository, QueryContext, RepositoryType};
use crate::models::{DateRange, DateRangeError};
use crate::services::session::{DashboardSession, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("{0}")]
    Validation(String),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),
}

impl From<DateRangeError> for ControllerError {
    fn from(err: DateRangeError) -> Self {
        ControllerError::Validation(err.to_string())
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Result of one refresh attempt. Both variants carry the session's snapshot
/// after the attempt.
#[derive(Debug)]
enum RefreshOutcome {
    Committed(SessionSnapshot),
    Superseded(SessionSnapshot),
}

impl RefreshOutcome {
    fn into_snapshot(self) -> SessionSnapshot {
        match self {
            Self::Committed(snapshot) | Self::Superseded(snapshot) => snapshot,
        }
    }
}

pub struct DashboardController {
    repository: Arc<dyn MetricRepository>,
    sessions: SessionStore,
    default_range: DateRange,
    auto_refresh: Option<Duration>,
    session_idle_timeout: Duration,
}

impl DashboardController {
    pub fn new(repository: Arc<dyn MetricRepository>, default_range: DateRange) -> Self {
        Self {
            repository,
            sessions: SessionStore::new(),
            default_range,
            auto_refresh: None,
            session_idle_timeout: Duration::from_secs(3600),
        }
    }

    pub fn with_auto_refresh(mut self, interval: Option<Duration>) -> Self {
        self.auto_refresh = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    pub fn repository(&self) -> &Arc<dyn MetricRepository> {
        &self.repository
    }

    pub fn repository_type(&self) -> RepositoryType {
        self.repository.repository_type()
    }

    pub fn default_range(&self) -> DateRange {
        self.default_range
    }

    pub fn auto_refresh(&self) -> Option<Duration> {
        self.auto_refresh
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Parse optional `start`/`end` strings against the default range and
    /// check the result against the backend.
    pub fn resolve_range(&self, start: Option<&str>, end: Option<&str>) -> ControllerResult<DateRange> {
        let range = DateRange::parse(start, end, &self.default_range)?;
        self.validate(&range)?;
        Ok(range)
    }

    fn validate(&self, range: &DateRange) -> ControllerResult<()> {
        self.repository
            .validate_range(range)
            .map_err(|e| ControllerError::Validation(e.message().to_string()))
    }

    /// Fetch all six tables and compose them into one view.
    pub async fn render(&self, range: &DateRange, ctx: &QueryContext) -> ControllerResult<DashboardView> {
        self.validate(range)?;
        let started = Instant::now();

        match self.repository.fetch_all(range, ctx).await {
            Ok(tables) => {
                let panels: Vec<ChartPanel> = tables.iter().map(ChartPanel::compose).collect();
                debug!(
                    start = %range.start(),
                    end = %range.end(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Dashboard rendered"
                );
                Ok(DashboardView::ready(*range, panels))
            }
            Err(e) if e.is_validation() => Err(ControllerError::Validation(e.message().to_string())),
            Err(e) => {
                warn!(
                    start = %range.start(),
                    end = %range.end(),
                    error = %e,
                    "Dashboard refresh failed"
                );
                Ok(DashboardView::failed(*range, DashboardError::from(&e)))
            }
        }
    }

    /// Create a session and render it once.
    pub async fn open_session(&self, range: DateRange, ctx: QueryContext) -> ControllerResult<SessionSnapshot> {
        self.validate(&range)?;
        let session = self.sessions.create(range, ctx);
        info!(session = %session.id(), %range, "Session opened");
        self.run_refresh(&session, RefreshTrigger::Load, None, None)
            .await
            .map(RefreshOutcome::into_snapshot)
    }

    /// Switch the session to `range` and refresh.
    pub async fn set_range(
        &self,
        id: &SessionId,
        range: DateRange,
        ctx: Option<QueryContext>,
    ) -> ControllerResult<SessionSnapshot> {
        let session = self.session(id)?;
        self.validate(&range)?;
        self.run_refresh(&session, RefreshTrigger::RangeChange, Some(range), ctx)
            .await
            .map(RefreshOutcome::into_snapshot)
    }

    /// Re-render the session's current range.
    pub async fn refresh(&self, id: &SessionId, ctx: Option<QueryContext>) -> ControllerResult<SessionSnapshot> {
        let session = self.session(id)?;
        self.run_refresh(&session, RefreshTrigger::Manual, None, ctx)
            .await
            .map(RefreshOutcome::into_snapshot)
    }

    pub fn snapshot(&self, id: &SessionId) -> ControllerResult<SessionSnapshot> {
        let session = self.session(id)?;
        session.touch();
        Ok(session.snapshot())
    }

    pub fn subscribe(&self, id: &SessionId) -> ControllerResult<broadcast::Receiver<SessionSnapshot>> {
        Ok(self.session(id)?.subscribe())
    }

    fn session(&self, id: &SessionId) -> ControllerResult<Arc<DashboardSession>> {
        self.sessions
            .get(id)
            .ok_or(ControllerError::UnknownSession(*id))
    }

    /// Register, wait for the session lock, render, commit if still latest.
    ///
    /// A superseded refresh returns the session's current snapshot without
    /// committing anything.
    async fn run_refresh(
        &self,
        session: &DashboardSession,
        trigger: RefreshTrigger,
        range: Option<DateRange>,
        ctx: Option<QueryContext>,
    ) -> ControllerResult<RefreshOutcome> {
        let ticket = session.begin(trigger, range, ctx);
        let _guard = session.lock_refresh().await;

        if !session.is_current(ticket.generation) {
            debug!(session = %session.id(), generation = %ticket.generation, "Refresh superseded before start");
            return Ok(RefreshOutcome::Superseded(session.snapshot()));
        }

        let view = self.render(&ticket.range, &ticket.ctx).await?;
        match session.commit(&ticket, view) {
            Some(snapshot) => {
                info!(
                    session = %session.id(),
                    generation = %ticket.generation,
                    trigger = ?trigger,
                    ready = snapshot.view.as_ref().map_or(false, DashboardView::is_ready),
                    "Dashboard committed"
                );
                Ok(RefreshOutcome::Committed(snapshot))
            }
            None => {
                debug!(session = %session.id(), generation = %ticket.generation, "Refresh result discarded");
                Ok(RefreshOutcome::Superseded(session.snapshot()))
            }
        }
    }

    /// Refresh every open session once. Returns how many committed; a
    /// refresh overtaken by a newer request does not count.
    pub async fn refresh_all(&self, trigger: RefreshTrigger) -> usize {
        let mut committed = 0;
        for session in self.sessions.all() {
            match self.run_refresh(&session, trigger, None, None).await {
                Ok(RefreshOutcome::Committed(_)) => committed += 1,
                Ok(RefreshOutcome::Superseded(_)) => {}
                Err(e) => warn!(session = %session.id(), error = %e, "Scheduled refresh rejected"),
            }
        }
        committed
    }

    /// Start the background timer. Each tick drops idle sessions and
    /// refreshes the rest. Returns `None` when auto-refresh is off.
    pub fn spawn_auto_refresh(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.auto_refresh?;
        let controller = Arc::clone(self);
        info!(interval_secs = period.as_secs(), "Auto-refresh enabled");

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let pruned = controller.sessions.prune_idle(controller.session_idle_timeout);
                if pruned > 0 {
                    info!(pruned, "Dropped idle sessions");
                }
                let refreshed = controller.refresh_all(RefreshTrigger::Timer).await;
                debug!(refreshed, "Auto-refresh tick");
            }
        }))
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
