use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::db::repositories::{LocalRepository, SyntheticRepository};
use crate::db::{RepositoryResult, RepositoryType};
use crate::models::date_range::ymd;
use crate::models::{DashboardTables, DateBounds, MetricDomain, MetricTable};
use crate::services::generator::SyntheticGenerator;

/// Synthetic data with a fixed delay per full render.
struct SlowRepository {
    inner: SyntheticRepository,
    delay: Duration,
    renders: AtomicUsize,
}

impl SlowRepository {
    fn new(delay_ms: u64) -> Self {
        Self {
            inner: SyntheticRepository::new(SyntheticGenerator::with_seed(1), DateBounds::default()),
            delay: Duration::from_millis(delay_ms),
            renders: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetricRepository for SlowRepository {
    fn repository_type(&self) -> RepositoryType {
        RepositoryType::Synthetic
    }

    async fn health_check(&self, ctx: &QueryContext) -> RepositoryResult<bool> {
        self.inner.health_check(ctx).await
    }

    fn validate_range(&self, range: &DateRange) -> RepositoryResult<()> {
        self.inner.validate_range(range)
    }

    async fn fetch_table(
        &self,
        domain: MetricDomain,
        range: &DateRange,
        ctx: &QueryContext,
    ) -> RepositoryResult<MetricTable> {
        self.inner.fetch_table(domain, range, ctx).await
    }

    async fn fetch_all(&self, range: &DateRange, ctx: &QueryContext) -> RepositoryResult<DashboardTables> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_all(range, ctx).await
    }
}

fn range(start_day: u32, end_day: u32) -> DateRange {
    DateRange::new(ymd(2024, 1, start_day), ymd(2024, 1, end_day)).unwrap()
}

fn synthetic_controller() -> DashboardController {
    let repo = SyntheticRepository::new(SyntheticGenerator::with_seed(3), DateBounds::default());
    DashboardController::new(Arc::new(repo), DateBounds::default().full_range())
}

#[tokio::test]
async fn test_render_produces_six_panels() {
    let controller = synthetic_controller();
    let view = controller
        .render(&range(1, 7), &QueryContext::new())
        .await
        .unwrap();
    assert!(view.is_ready());
    assert_eq!(view.panels().len(), 6);
    let domains: Vec<MetricDomain> = view.panels().iter().map(|p| p.domain).collect();
    assert_eq!(domains, MetricDomain::ALL.to_vec());
}

#[tokio::test]
async fn test_out_of_bounds_is_rejected_before_generation() {
    let controller = synthetic_controller();
    let bad = DateRange::new(ymd(2026, 1, 1), ymd(2026, 1, 2)).unwrap();
    let err = controller.render(&bad, &QueryContext::new()).await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));

    assert!(controller.open_session(bad, QueryContext::new()).await.is_err());
    assert!(controller.sessions().is_empty());
}

#[test]
fn test_resolve_range_falls_back_to_default() {
    let controller = synthetic_controller();
    let full = controller.resolve_range(None, Some("")).unwrap();
    assert_eq!(full, DateBounds::default().full_range());

    let partial = controller.resolve_range(Some("2025-05-01"), None).unwrap();
    assert_eq!(partial.start(), ymd(2025, 5, 1));
    assert_eq!(partial.end(), ymd(2025, 5, 31));

    assert!(matches!(
        controller.resolve_range(Some("2024-02-10"), Some("2024-02-01")),
        Err(ControllerError::Validation(_))
    ));
    assert!(matches!(
        controller.resolve_range(Some("01/02/2024"), None),
        Err(ControllerError::Validation(_))
    ));
}

#[tokio::test]
async fn test_backend_failure_becomes_error_banner() {
    let local = LocalRepository::seeded(&SyntheticGenerator::with_seed(2), &range(1, 31));
    local.set_healthy(false);
    let controller = DashboardController::new(Arc::new(local.clone()), range(1, 31));

    let snapshot = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let view = snapshot.view.unwrap();
    assert!(!view.is_ready());
    assert!(view.panels().is_empty());
    assert_eq!(view.error().unwrap().kind, "connection");

    local.set_healthy(true);
    let snapshot = controller.refresh(&snapshot.session_id, None).await.unwrap();
    assert!(snapshot.view.unwrap().is_ready());
}

#[tokio::test]
async fn test_local_range_before_data_renders_empty_charts() {
    let local = LocalRepository::seeded(&SyntheticGenerator::with_seed(2), &range(10, 20));
    let controller = DashboardController::new(Arc::new(local), range(10, 20));
    let view = controller
        .render(&range(1, 5), &QueryContext::new())
        .await
        .unwrap();
    assert!(view.is_ready());
    assert!(view.panels().iter().all(|p| p.figure.point_count() == 0));
}

#[tokio::test]
async fn test_unknown_session() {
    let controller = synthetic_controller();
    let id = SessionId::new();
    assert_eq!(
        controller.refresh(&id, None).await.unwrap_err(),
        ControllerError::UnknownSession(id)
    );
    assert!(controller.snapshot(&id).is_err());
    assert!(controller.subscribe(&id).is_err());
}

#[tokio::test]
async fn test_set_range_updates_session() {
    let controller = synthetic_controller();
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    assert_eq!(opened.trigger, Some(RefreshTrigger::Load));

    let changed = controller
        .set_range(&opened.session_id, range(2, 4), None)
        .await
        .unwrap();
    assert_eq!(changed.range, range(2, 4));
    assert_eq!(changed.trigger, Some(RefreshTrigger::RangeChange));
    assert!(changed.generation > opened.generation);
    let view = changed.view.unwrap();
    assert_eq!(view.range(), &range(2, 4));
    assert_eq!(view.panels()[0].figure.data[0].x.len(), 3);
}

#[tokio::test]
async fn test_invalid_range_leaves_session_untouched() {
    let controller = synthetic_controller();
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let outside = DateRange::new(ymd(2023, 12, 1), ymd(2024, 1, 2)).unwrap();
    assert!(controller
        .set_range(&opened.session_id, outside, None)
        .await
        .is_err());
    let snapshot = controller.snapshot(&opened.session_id).unwrap();
    assert_eq!(snapshot.range, range(1, 7));
    assert_eq!(snapshot.generation, opened.generation);
}

#[tokio::test]
async fn test_quick_refreshes_settle_on_latest_trigger() {
    let repo = Arc::new(SlowRepository::new(50));
    let controller = DashboardController::new(repo.clone(), DateBounds::default().full_range());
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let id = opened.session_id;

    let (a, b, c) = tokio::join!(
        controller.set_range(&id, range(1, 10), None),
        controller.set_range(&id, range(1, 20), None),
        controller.set_range(&id, range(1, 3), None),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let snapshot = controller.snapshot(&id).unwrap();
    assert_eq!(snapshot.range, range(1, 3));
    let view = snapshot.view.unwrap();
    assert_eq!(view.range(), &range(1, 3));
    for panel in view.panels() {
        for trace in &panel.figure.data {
            assert_eq!(trace.x.len(), 3);
        }
    }
    // open + first + last; the middle one is superseded before it starts.
    assert_eq!(repo.renders.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_refresh_all_broadcasts_to_subscribers() {
    let controller = synthetic_controller();
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let mut rx = controller.subscribe(&opened.session_id).unwrap();

    assert_eq!(controller.refresh_all(RefreshTrigger::Timer).await, 1);
    let update = rx.recv().await.unwrap();
    assert_eq!(update.trigger, Some(RefreshTrigger::Timer));
    assert!(update.generation > opened.generation);
}

#[tokio::test]
async fn test_auto_refresh_disabled_without_interval() {
    let controller = Arc::new(synthetic_controller().with_auto_refresh(Some(Duration::ZERO)));
    assert!(controller.auto_refresh().is_none());
    assert!(controller.spawn_auto_refresh().is_none());
}

#[tokio::test]
async fn test_auto_refresh_ticks() {
    let controller =
        Arc::new(synthetic_controller().with_auto_refresh(Some(Duration::from_millis(50))));
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let mut rx = controller.subscribe(&opened.session_id).unwrap();

    let handle = controller.spawn_auto_refresh().unwrap();
    let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.trigger, Some(RefreshTrigger::Timer));
    handle.abort();
}

#[tokio::test]
async fn test_refresh_all_does_not_count_overtaken_refresh() {
    let repo = Arc::new(SlowRepository::new(100));
    let controller = DashboardController::new(repo.clone(), DateBounds::default().full_range());
    let opened = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let id = opened.session_id;

    let (committed, changed) = tokio::join!(
        controller.refresh_all(RefreshTrigger::Timer),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.set_range(&id, range(1, 3), None).await
        },
    );

    assert_eq!(committed, 0);
    let changed = changed.unwrap();
    assert_eq!(changed.trigger, Some(RefreshTrigger::RangeChange));
    assert_eq!(changed.range, range(1, 3));
    assert_eq!(controller.refresh_all(RefreshTrigger::Timer).await, 1);
}

#[tokio::test]
async fn test_auto_refresh_keeps_watched_session_alive() {
    let controller = Arc::new(
        synthetic_controller()
            .with_auto_refresh(Some(Duration::from_millis(40)))
            .with_session_idle_timeout(Duration::from_millis(100)),
    );
    let watched = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let unwatched = controller
        .open_session(range(1, 7), QueryContext::new())
        .await
        .unwrap();
    let mut rx = controller.subscribe(&watched.session_id).unwrap();

    let handle = controller.spawn_auto_refresh().unwrap();
    for _ in 0..6 {
        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.trigger, Some(RefreshTrigger::Timer));
    }
    handle.abort();

    assert!(controller.sessions().get(&watched.session_id).is_some());
    assert!(controller.sessions().get(&unwatched.session_id).is_none());
}
