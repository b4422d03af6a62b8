//! In-memory warehouse snapshot.
//!
//! Holds whole metric tables in memory and answers range reads with the same
//! semantics as the warehouse: rows filtered to the inclusive range, ordered
//! by date then category, and an empty table (not an error) when nothing
//! matches. Used for local development and in tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::factory::RepositoryType;
use crate::db::repository::{MetricRepository, QueryContext, RepositoryError, RepositoryResult};
use crate::models::{DateRange, MetricDomain, MetricRow, MetricTable};
use crate::services::generator::SyntheticGenerator;

/// In-memory local repository.
///
/// # Example
/// ```
/// use fuel_dashboard::db::repositories::LocalRepository;
/// use fuel_dashboard::models::MetricDomain;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.row_count(MetricDomain::Gallons), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    tables: HashMap<MetricDomain, Vec<MetricRow>>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRepository {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Snapshot holding one generated pass over `range`.
    pub fn seeded(generator: &SyntheticGenerator, range: &DateRange) -> Self {
        let repo = Self::new();
        for table in generator.generate_all(range) {
            repo.store_table(table);
        }
        repo
    }

    /// Replace the rows held for the table's domain.
    pub fn store_table(&self, table: MetricTable) {
        let domain = table.domain;
        self.data.write().tables.insert(domain, table.into_rows());
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Drop every stored row.
    pub fn clear(&self) {
        self.data.write().tables.clear();
    }

    pub fn row_count(&self, domain: MetricDomain) -> usize {
        self.data.read().tables.get(&domain).map_or(0, Vec::len)
    }

    fn ensure_healthy(&self) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Local repository is marked unhealthy"))
        }
    }
}

#[async_trait]
impl MetricRepository for LocalRepository {
    fn repository_type(&self) -> RepositoryType {
        RepositoryType::Local
    }

    async fn health_check(&self, _ctx: &QueryContext) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn fetch_table(
        &self,
        domain: MetricDomain,
        range: &DateRange,
        _ctx: &QueryContext,
    ) -> RepositoryResult<MetricTable> {
        self.ensure_healthy()?;
        let rows: Vec<MetricRow> = self
            .data
            .read()
            .tables
            .get(&domain)
            .map(|rows| {
                rows.iter()
                    .filter(|row| range.contains(row.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(MetricTable::from_rows(domain, rows))
    }
}
