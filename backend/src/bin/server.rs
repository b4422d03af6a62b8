//! Fuel Margin Dashboard server binary.
//!
//! Loads configuration, builds the selected repository, starts the
//! auto-refresh task and serves the dashboard page plus its JSON API.
//!
//! # Usage
//!
//! ```bash
//! # Synthetic data (default)
//! cargo run --bin dashboard-server
//!
//! # SQL warehouse
//! REPOSITORY_TYPE=warehouse WAREHOUSE_HOST=localhost WAREHOUSE_DATABASE=fuel \
//!   cargo run --bin dashboard-server --features warehouse
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DASHBOARD_CONFIG`: Path to a TOML configuration file
//! - `REPOSITORY_TYPE`: `synthetic`, `local` or `warehouse`
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use fuel_dashboard::db::{RepositoryConfig, RepositoryFactory, RepositoryType};
use fuel_dashboard::http::{create_router, AppState};
use fuel_dashboard::services::DashboardController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fuel_dashboard::logging::init();

    info!("Starting Fuel Margin Dashboard");

    let config = RepositoryConfig::load()?;
    let repo_type = config
        .repository_type()
        .map_err(|e| anyhow::anyhow!("Invalid repository type: {}", e))?;
    let bounds = config.bounds()?;
    let repository = RepositoryFactory::create(repo_type, &config)?;
    info!(backend = %repo_type, "Repository initialized successfully");

    let controller = Arc::new(
        DashboardController::new(repository, bounds.full_range())
            .with_auto_refresh(config.auto_refresh_interval(repo_type))
            .with_session_idle_timeout(config.session_idle_timeout()),
    );
    // Runs for the lifetime of the process.
    let _auto_refresh = controller.spawn_auto_refresh();

    let mut state = AppState::new(controller);
    if repo_type == RepositoryType::Synthetic {
        state = state.with_bounds(bounds);
    }
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
