//! Warehouse seeding binary.
//!
//! Creates the schema if needed and overwrites the six metric tables with
//! generated data covering the configured bounds.
//!
//! # Environment Variables
//!
//! - `DASHBOARD_CONFIG`: Path to a TOML configuration file
//! - `WAREHOUSE_*`: Connection overrides (see `RepositoryConfig::apply_env_overrides`)
//! - `SEED_ACCESS_TOKEN`: Token to use when the warehouse expects a forwarded token
//! - `RUST_LOG`: Log level (default: info)

use std::env;

use tracing::info;

use fuel_dashboard::db::repositories::warehouse::seed::seed_warehouse;
use fuel_dashboard::db::{QueryContext, RepositoryConfig, WarehouseRepository};
use fuel_dashboard::services::SyntheticGenerator;

const SEED_TOKEN_ENV: &str = "SEED_ACCESS_TOKEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fuel_dashboard::logging::init();

    let config = RepositoryConfig::load()?;
    let range = config.bounds()?.full_range();
    let repo = WarehouseRepository::new(config.to_warehouse_config()?)?;
    let generator = SyntheticGenerator::from_seed(config.synthetic.seed);

    let ctx = match env::var(SEED_TOKEN_ENV) {
        Ok(token) => QueryContext::with_forwarded_token(token),
        Err(_) => QueryContext::new(),
    };

    info!(start = %range.start(), end = %range.end(), "Seeding warehouse");
    let report = seed_warehouse(&repo, &generator, &range, &ctx).await?;
    for (domain, rows) in &report.rows {
        info!(domain = %domain, rows, "Table written");
    }
    info!(
        total_rows = report.total_rows(),
        migrations_applied = report.migrations_applied,
        "Seeding complete"
    );

    Ok(())
}
