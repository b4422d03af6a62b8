//! Repository trait for metric tables.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::factory::RepositoryType;
use crate::models::{DashboardTables, DateRange, MetricDomain, MetricTable};

/// Per-request inputs that are not part of the query itself.
///
/// Carries the access token the hosting platform forwards with each browser
/// request. Whether it is used depends on the warehouse auth strategy chosen
/// at startup; the other backends ignore it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    forwarded_token: Option<String>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forwarded_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            forwarded_token: (!token.trim().is_empty()).then_some(token),
        }
    }

    pub fn forwarded_token(&self) -> Option<&str> {
        self.forwarded_token.as_deref()
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field(
                "forwarded_token",
                &self.forwarded_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Source of the six metric tables.
///
/// Implementations must return whole tables or an error, never a partially
/// filled table.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Which backend this is.
    fn repository_type(&self) -> RepositoryType;

    /// Check that the backend can serve queries.
    async fn health_check(&self, ctx: &QueryContext) -> RepositoryResult<bool>;

    /// Reject ranges this backend cannot serve, before any work is done.
    fn validate_range(&self, _range: &DateRange) -> RepositoryResult<()> {
        Ok(())
    }

    /// Fetch one domain's rows within `range`, ordered by date.
    async fn fetch_table(
        &self,
        domain: MetricDomain,
        range: &DateRange,
        ctx: &QueryContext,
    ) -> RepositoryResult<MetricTable>;

    /// Fetch all six domains. Fails as a whole if any domain fails.
    async fn fetch_all(
        &self,
        range: &DateRange,
        ctx: &QueryContext,
    ) -> RepositoryResult<DashboardTables> {
        self.validate_range(range)?;
        let mut tables = Vec::with_capacity(MetricDomain::ALL.len());
        for domain in MetricDomain::ALL {
            tables.push(self.fetch_table(domain, range, ctx).await?);
        }
        Ok(DashboardTables::from_tables(tables))
    }
}
