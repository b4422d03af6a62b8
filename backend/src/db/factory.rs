//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::repo_config::RepositoryConfig;
use super::repositories::{LocalRepository, SyntheticRepository};
#[cfg(feature = "warehouse")]
use super::repositories::WarehouseRepository;
use super::repository::{MetricRepository, RepositoryError, RepositoryResult};
use crate::services::generator::SyntheticGenerator;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    /// Data generated on every read
    Synthetic,
    /// In-memory warehouse snapshot seeded from the generator
    Local,
    /// SQL warehouse over Diesel
    Warehouse,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("synthetic", "local", "warehouse")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "synthetic" | "generator" => Ok(Self::Synthetic),
            "local" | "memory" => Ok(Self::Local),
            "warehouse" | "postgres" | "pg" => Ok(Self::Warehouse),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Synthetic => "synthetic",
            Self::Local => "local",
            Self::Warehouse => "warehouse",
        };
        f.write_str(name)
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// Defaults to Synthetic when unset or unrecognized.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Synthetic)
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use fuel_dashboard::db::{RepositoryConfig, RepositoryFactory, RepositoryType};
///
/// let config = RepositoryConfig::default();
/// let repo = RepositoryFactory::create(RepositoryType::Local, &config)?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `config` - Full configuration; each backend reads its own section
    pub fn create(
        repo_type: RepositoryType,
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn MetricRepository>> {
        info!(repository = %repo_type, "Creating repository");
        match repo_type {
            RepositoryType::Synthetic => Ok(Arc::new(Self::create_synthetic(config)?)),
            RepositoryType::Local => Ok(Arc::new(Self::create_local(config)?)),
            RepositoryType::Warehouse => {
                #[cfg(feature = "warehouse")]
                {
                    let wh = Self::create_warehouse(config)?;
                    Ok(wh as Arc<dyn MetricRepository>)
                }
                #[cfg(not(feature = "warehouse"))]
                {
                    Err(RepositoryError::configuration(
                        "Warehouse repository feature not enabled",
                    ))
                }
            }
        }
    }

    pub fn create_synthetic(config: &RepositoryConfig) -> RepositoryResult<SyntheticRepository> {
        Ok(SyntheticRepository::new(
            SyntheticGenerator::from_seed(config.synthetic.seed),
            config.bounds()?,
        ))
    }

    /// In-memory snapshot holding one generated pass over the configured bounds.
    pub fn create_local(config: &RepositoryConfig) -> RepositoryResult<LocalRepository> {
        let generator = SyntheticGenerator::from_seed(config.synthetic.seed);
        Ok(LocalRepository::seeded(
            &generator,
            &config.bounds()?.full_range(),
        ))
    }

    #[cfg(feature = "warehouse")]
    pub fn create_warehouse(config: &RepositoryConfig) -> RepositoryResult<Arc<WarehouseRepository>> {
        let repo = WarehouseRepository::new(config.to_warehouse_config()?)?;
        Ok(Arc::new(repo))
    }

    /// Create repository from a TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn MetricRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config)
    }

    /// Create repository from a RepositoryConfig instance.
    pub fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn MetricRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        Self::create(repo_type, config)
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use fuel_dashboard::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Synthetic)
///     .seed(42)
///     .build()?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    config: RepositoryConfig,
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryBuilder {
    /// Create a new repository builder with default settings.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::Synthetic,
            config: RepositoryConfig::default(),
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Fix the generator seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.synthetic.seed = Some(seed);
        self
    }

    /// Replace the whole configuration; the type is taken from it.
    pub fn config(mut self, config: RepositoryConfig) -> Result<Self, RepositoryError> {
        self.repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        self.config = config;
        Ok(self)
    }

    /// Load configuration from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(self, config_path: P) -> Result<Self, RepositoryError> {
        self.config(RepositoryConfig::from_file(config_path)?)
    }

    /// Build the repository instance.
    pub fn build(self) -> RepositoryResult<Arc<dyn MetricRepository>> {
        RepositoryFactory::create(self.repo_type, &self.config)
    }
}
