//! Data sources for the dashboard.
//!
//! This module provides abstractions for reading metric tables via the
//! Repository pattern, so the controller does not care whether data is
//! generated, held in memory, or read from the warehouse.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer / binaries                                  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  DashboardController (services::controller)             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  MetricRepository trait (repository::metrics)           │
//! └───────┬───────────────────┬───────────────────┬─────────┘
//!         │                   │                   │
//!   Synthetic           Local snapshot       Warehouse
//!   (generator)         (in-memory)          (diesel, feature)
//! ```
//!
//! # Module layout
//! - `repository`: trait, query context, error types
//! - `repositories`: the three implementations
//! - `factory`: creates a repository from configuration
//! - `repo_config`: `dashboard.toml` and environment overrides

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::{AuthStrategy, LocalRepository, SyntheticRepository, WarehouseConfig};
#[cfg(feature = "warehouse")]
pub use repositories::WarehouseRepository;
pub use repository::{
    ErrorContext, MetricRepository, QueryContext, RepositoryError, RepositoryResult,
};
