//! Dashboard configuration file support.
//!
//! This module reads `dashboard.toml` and layers environment variables over
//! it. Every section is optional; an absent file means all defaults.
//!
//! ```toml
//! [repository]
//! type = "warehouse"
//!
//! [synthetic]
//! seed = 42
//! earliest = "2024-01-01"
//! latest = "2025-05-31"
//!
//! [warehouse]
//! host = "warehouse.internal"
//! database = "analytics"
//! max_retries = 2
//!
//! [warehouse.profiles.default]
//! token = "..."
//!
//! [dashboard]
//! auto_refresh_secs = 60
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::factory::RepositoryType;
use super::repositories::WarehouseConfig;
use super::repository::RepositoryError;
use crate::models::DateBounds;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "DASHBOARD_CONFIG";

/// Auto-refresh interval used by the warehouse backend when none is configured.
pub const DEFAULT_WAREHOUSE_REFRESH_SECS: u64 = 60;

/// Dashboard configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub synthetic: SyntheticSettings,
    #[serde(default)]
    pub warehouse: WarehouseSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

fn default_repo_type() -> String {
    "synthetic".to_string()
}

/// Generator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSettings {
    /// Fixed RNG seed. Absent means fresh entropy on every refresh.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub earliest: Option<NaiveDate>,
    #[serde(default)]
    pub latest: Option<NaiveDate>,
}

/// Warehouse connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSettings {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    /// `forwarded` or `profile`; detected when absent.
    #[serde(default)]
    pub auth: Option<String>,
    /// Profile name under `profiles`.
    #[serde(default)]
    pub profile: Option<String>,
    /// Token that takes precedence over any profile token.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Running behind the hosting platform's proxy.
    #[serde(default)]
    pub hosted: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileSettings>,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            database: String::new(),
            user: String::new(),
            sslmode: default_sslmode(),
            auth: None,
            profile: None,
            token: None,
            hosted: false,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_sec: default_connect_timeout(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Named local credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Seconds between automatic refreshes; `0` disables them. Absent means
    /// 60 for the warehouse backend and off otherwise.
    #[serde(default)]
    pub auto_refresh_secs: Option<u64>,
    /// Sessions untouched for this long are dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            auto_refresh_secs: None,
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_port() -> u16 {
    5432
}

fn default_sslmode() -> String {
    "prefer".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_session_idle_secs() -> u64 {
    3600
}

impl RepositoryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `dashboard.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// # Returns
    /// * `Ok(Some(RepositoryConfig))` if found and parsed successfully
    /// * `Ok(None)` if no config file exists
    /// * `Err(RepositoryError)` on parse error
    pub fn from_default_location() -> Result<Option<Self>, RepositoryError> {
        let search_paths = [
            PathBuf::from("dashboard.toml"),
            PathBuf::from("backend/dashboard.toml"),
            PathBuf::from("../dashboard.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Resolve the full configuration for the running process.
    ///
    /// Reads the file named by `DASHBOARD_CONFIG` (which must exist) or the
    /// default location, then applies environment overrides.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::from_default_location()?.unwrap_or_default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    ///
    /// Recognized keys: `REPOSITORY_TYPE`, `SYNTHETIC_SEED`, `WAREHOUSE_HOST`,
    /// `WAREHOUSE_PORT`, `WAREHOUSE_DATABASE`, `WAREHOUSE_USER`,
    /// `WAREHOUSE_AUTH`, `WAREHOUSE_PROFILE`, `WAREHOUSE_TOKEN`,
    /// `WAREHOUSE_MAX_RETRIES`, `DASHBOARD_HOSTED`, `AUTO_REFRESH_SECS`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REPOSITORY_TYPE") {
            self.repository.repo_type = v;
        }
        if let Some(v) = get("SYNTHETIC_SEED") {
            self.synthetic.seed = Some(parse_env("SYNTHETIC_SEED", &v)?);
        }

        let wh = &mut self.warehouse;
        if let Some(v) = get("WAREHOUSE_HOST") {
            wh.host = v;
        }
        if let Some(v) = get("WAREHOUSE_PORT") {
            wh.port = parse_env("WAREHOUSE_PORT", &v)?;
        }
        if let Some(v) = get("WAREHOUSE_DATABASE") {
            wh.database = v;
        }
        if let Some(v) = get("WAREHOUSE_USER") {
            wh.user = v;
        }
        if let Some(v) = get("WAREHOUSE_AUTH") {
            wh.auth = Some(v);
        }
        if let Some(v) = get("WAREHOUSE_PROFILE") {
            wh.profile = Some(v);
        }
        if let Some(v) = get("WAREHOUSE_TOKEN") {
            wh.token = Some(v);
        }
        if let Some(v) = get("WAREHOUSE_MAX_RETRIES") {
            wh.max_retries = parse_env("WAREHOUSE_MAX_RETRIES", &v)?;
        }
        if lookup("DASHBOARD_HOSTED").is_some() {
            wh.hosted = true;
        }

        if let Some(v) = get("AUTO_REFRESH_SECS") {
            self.dashboard.auto_refresh_secs = Some(parse_env("AUTO_REFRESH_SECS", &v)?);
        }
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// Supported window for the synthetic backend.
    pub fn bounds(&self) -> Result<DateBounds, RepositoryError> {
        let defaults = DateBounds::default();
        DateBounds::new(
            self.synthetic.earliest.unwrap_or(defaults.earliest),
            self.synthetic.latest.unwrap_or(defaults.latest),
        )
        .map_err(|e| RepositoryError::configuration(format!("Invalid synthetic bounds: {}", e)))
    }

    pub fn to_warehouse_config(&self) -> Result<WarehouseConfig, RepositoryError> {
        WarehouseConfig::from_settings(&self.warehouse)
    }

    /// Auto-refresh period for `repo_type`, or `None` when disabled.
    pub fn auto_refresh_interval(&self, repo_type: RepositoryType) -> Option<Duration> {
        let secs = match self.dashboard.auto_refresh_secs {
            Some(secs) => secs,
            None if repo_type == RepositoryType::Warehouse => DEFAULT_WAREHOUSE_REFRESH_SECS,
            None => 0,
        };
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.dashboard.session_idle_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, RepositoryError> {
    value.trim().parse().map_err(|_| {
        RepositoryError::configuration(format!("Invalid value for {}: '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::date_range::ymd;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = RepositoryConfig::from_toml_str("").unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Synthetic);
        assert_eq!(config.bounds().unwrap(), DateBounds::default());
        assert_eq!(config.warehouse.max_retries, 2);
        assert_eq!(config.auto_refresh_interval(RepositoryType::Synthetic), None);
        assert_eq!(
            config.auto_refresh_interval(RepositoryType::Warehouse),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_parse_warehouse_config() {
        let toml = r#"
[repository]
type = "warehouse"

[synthetic]
seed = 7
latest = "2024-12-31"

[warehouse]
host = "wh.example"
database = "analytics"
max_retries = 4

[warehouse.profiles.default]
user = "analyst"
token = "abc"

[dashboard]
auto_refresh_secs = 0
"#;

        let config = RepositoryConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Warehouse);
        assert_eq!(config.synthetic.seed, Some(7));
        assert_eq!(config.bounds().unwrap().latest, ymd(2024, 12, 31));
        assert_eq!(config.auto_refresh_interval(RepositoryType::Warehouse), None);

        let wh = config.to_warehouse_config().unwrap();
        assert_eq!(wh.host, "wh.example");
        assert_eq!(wh.user, "analyst");
        assert_eq!(wh.max_retries, 4);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = RepositoryConfig::from_toml_str("[repository]\ntype = \"local\"").unwrap();
        config
            .apply_env_overrides(env(&[
                ("REPOSITORY_TYPE", "warehouse"),
                ("WAREHOUSE_HOST", "env-host"),
                ("WAREHOUSE_DATABASE", "db"),
                ("WAREHOUSE_PORT", "6543"),
                ("DASHBOARD_HOSTED", ""),
                ("AUTO_REFRESH_SECS", "15"),
            ]))
            .unwrap();

        assert_eq!(config.repository_type().unwrap(), RepositoryType::Warehouse);
        assert!(config.warehouse.hosted);
        assert_eq!(
            config.auto_refresh_interval(RepositoryType::Warehouse),
            Some(Duration::from_secs(15))
        );
        let wh = config.to_warehouse_config().unwrap();
        assert_eq!(wh.host, "env-host");
        assert_eq!(wh.port, 6543);
        assert_eq!(wh.auth.name(), "forwarded");
    }

    #[test]
    fn test_bad_env_value_is_configuration_error() {
        let mut config = RepositoryConfig::default();
        let err = config
            .apply_env_overrides(env(&[("WAREHOUSE_PORT", "not-a-port")]))
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = RepositoryConfig::from_toml_str(
            "[synthetic]\nearliest = \"2025-01-01\"\nlatest = \"2024-01-01\"",
        )
        .unwrap();
        assert!(config.bounds().is_err());
    }
}
