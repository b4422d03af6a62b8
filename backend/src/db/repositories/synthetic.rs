//! Repository that generates its data on every read.

use async_trait::async_trait;
use tracing::debug;

use crate::db::factory::RepositoryType;
use crate::db::repository::{MetricRepository, QueryContext, RepositoryResult};
use crate::models::{DashboardTables, DateBounds, DateRange, MetricDomain, MetricTable};
use crate::services::generator::SyntheticGenerator;

/// Synthetic backend restricted to a supported window.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRepository {
    generator: SyntheticGenerator,
    bounds: DateBounds,
}

impl SyntheticRepository {
    pub fn new(generator: SyntheticGenerator, bounds: DateBounds) -> Self {
        Self { generator, bounds }
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn generator(&self) -> &SyntheticGenerator {
        &self.generator
    }
}

#[async_trait]
impl MetricRepository for SyntheticRepository {
    fn repository_type(&self) -> RepositoryType {
        RepositoryType::Synthetic
    }

    async fn health_check(&self, _ctx: &QueryContext) -> RepositoryResult<bool> {
        Ok(true)
    }

    fn validate_range(&self, range: &DateRange) -> RepositoryResult<()> {
        self.bounds.check(range)?;
        Ok(())
    }

    async fn fetch_table(
        &self,
        domain: MetricDomain,
        range: &DateRange,
        _ctx: &QueryContext,
    ) -> RepositoryResult<MetricTable> {
        self.validate_range(range)?;
        Ok(self.generator.generate_table(range, domain))
    }

    /// One generator pass so the delta table agrees with market pricing.
    async fn fetch_all(
        &self,
        range: &DateRange,
        _ctx: &QueryContext,
    ) -> RepositoryResult<DashboardTables> {
        self.validate_range(range)?;
        debug!(%range, seed = ?self.generator.seed(), "Generating synthetic tables");
        Ok(self.generator.generate_all(range))
    }
}
