//! Populate the warehouse with generated data.

use serde::Serialize;
use tracing::info;

use super::WarehouseRepository;
use crate::db::repository::{QueryContext, RepositoryResult};
use crate::models::{DateRange, MetricDomain};
use crate::services::generator::SyntheticGenerator;

/// Outcome of one seeding run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub range: DateRange,
    pub migrations_applied: usize,
    pub rows: Vec<(MetricDomain, usize)>,
}

impl SeedReport {
    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

/// Run migrations, then overwrite all six tables with one generated pass
/// over `range`. Each table is replaced in its own transaction.
pub async fn seed_warehouse(
    repo: &WarehouseRepository,
    generator: &SyntheticGenerator,
    range: &DateRange,
    ctx: &QueryContext,
) -> RepositoryResult<SeedReport> {
    let migrations_applied = repo.run_migrations(ctx).await?;
    info!(migrations_applied, "Warehouse schema ready");

    let tables = generator.generate_all(range);
    let mut rows = Vec::with_capacity(tables.len());
    for table in tables.iter() {
        let written = repo.overwrite_table(table, ctx).await?;
        info!(domain = %table.domain, rows = written, "Seeded table");
        rows.push((table.domain, written));
    }

    Ok(SeedReport {
        range: *range,
        migrations_applied,
        rows,
    })
}
