//! SQL warehouse repository using Diesel.
//!
//! Reads the six metric tables under the `apps_workshop` schema with one
//! parameterized query per domain.
//!
//! ## Connections
//!
//! There is no pool. Each query opens its own blocking `PgConnection` inside
//! `spawn_blocking` and drops it when the query returns. Connection failures
//! marked retryable are retried with exponential backoff; reads are
//! idempotent so replaying them is safe.
//!
//! ## Configuration
//!
//! Built from the `[warehouse]` section of `dashboard.toml` with `WAREHOUSE_*`
//! environment overrides applied (see [`crate::db::repo_config`]).

pub mod auth;
pub mod query;
#[cfg(feature = "warehouse")]
pub mod seed;

use crate::db::repo_config::WarehouseSettings;
use crate::db::repository::{RepositoryError, RepositoryResult};

pub use auth::{AuthStrategy, ProfileCredentials, FORWARDED_TOKEN_HEADER};

#[cfg(feature = "warehouse")]
pub use imp::WarehouseRepository;

/// Configuration for connecting to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Login role. Empty means the driver default.
    pub user: String,
    pub sslmode: String,
    pub auth: AuthStrategy,
    /// Maximum number of retry attempts for retryable failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
    pub connect_timeout_sec: u64,
}

impl WarehouseConfig {
    /// Build from settings, resolving the auth strategy and profile overrides.
    pub fn from_settings(settings: &WarehouseSettings) -> RepositoryResult<Self> {
        let auth = AuthStrategy::from_settings(settings)?;

        let mut host = settings.host.clone();
        let mut user = settings.user.clone();
        if let AuthStrategy::Profile(creds) = &auth {
            if let Some(profile) = settings.profiles.get(&creds.name) {
                if let Some(h) = &profile.host {
                    host = h.clone();
                }
                if let Some(u) = &profile.user {
                    user = u.clone();
                }
            }
        }

        if host.trim().is_empty() {
            return Err(RepositoryError::configuration(
                "Warehouse repository requires 'warehouse.host' (or WAREHOUSE_HOST)",
            ));
        }
        if settings.database.trim().is_empty() {
            return Err(RepositoryError::configuration(
                "Warehouse repository requires 'warehouse.database' (or WAREHOUSE_DATABASE)",
            ));
        }

        Ok(Self {
            host,
            port: settings.port,
            database: settings.database.clone(),
            user,
            sslmode: settings.sslmode.clone(),
            auth,
            max_retries: settings.max_retries,
            retry_delay_ms: settings.retry_delay_ms,
            connect_timeout_sec: settings.connect_timeout_sec,
        })
    }

    /// libpq keyword/value connection string. The token, when present, is
    /// passed as the password.
    pub fn conninfo(&self, token: Option<&str>) -> String {
        let mut parts = vec![
            format!("host={}", quote(&self.host)),
            format!("port={}", self.port),
            format!("dbname={}", quote(&self.database)),
            format!("sslmode={}", quote(&self.sslmode)),
            format!("connect_timeout={}", self.connect_timeout_sec),
        ];
        if !self.user.is_empty() {
            parts.push(format!("user={}", quote(&self.user)));
        }
        if let Some(token) = token {
            parts.push(format!("password={}", quote(token)));
        }
        parts.join(" ")
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

#[cfg(feature = "warehouse")]
mod imp {
    use async_trait::async_trait;
    use diesel::pg::PgConnection;
    use diesel::prelude::*;
    use diesel::sql_query;
    use diesel::sql_types::{Date, Double, Text};
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
    use std::time::{Duration, Instant};
    use tokio::task;
    use tracing::{debug, info, warn};

    use super::query::{self, MetricRowRecord};
    use super::WarehouseConfig;
    use crate::db::factory::RepositoryType;
    use crate::db::repository::{
        ErrorContext, MetricRepository, QueryContext, RepositoryError, RepositoryResult,
    };
    use crate::models::{DateRange, MetricDomain, MetricRow, MetricTable};

    pub(super) const MIGRATIONS: EmbeddedMigrations =
        embed_migrations!("src/db/repositories/warehouse/migrations");

    /// Warehouse-backed metric repository.
    pub struct WarehouseRepository {
        config: WarehouseConfig,
    }

    impl WarehouseRepository {
        pub fn new(config: WarehouseConfig) -> RepositoryResult<Self> {
            info!(
                host = %config.host,
                database = %config.database,
                auth = config.auth.name(),
                "Warehouse repository configured"
            );
            Ok(Self { config })
        }

        pub fn config(&self) -> &WarehouseConfig {
            &self.config
        }

        /// Open a connection, run `f`, drop the connection.
        ///
        /// Retries up to `max_retries` times when the error is retryable.
        pub(super) async fn with_conn<T, F>(
            &self,
            operation: &'static str,
            ctx: &QueryContext,
            f: F,
        ) -> RepositoryResult<T>
        where
            T: Send + 'static,
            F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
        {
            let token = self.config.auth.resolve_token(ctx)?;
            let conninfo = self.config.conninfo(token.as_deref());
            let max_retries = self.config.max_retries;
            let retry_delay_ms = self.config.retry_delay_ms;

            task::spawn_blocking(move || {
                let mut last_error = None;
                let mut retry_delay = Duration::from_millis(retry_delay_ms);

                for attempt in 0..=max_retries {
                    if attempt > 0 {
                        std::thread::sleep(retry_delay);
                        retry_delay *= 2;
                    }

                    let mut conn = match PgConnection::establish(&conninfo) {
                        Ok(c) => c,
                        Err(e) => {
                            let err = RepositoryError::from(e).with_operation(operation);
                            if err.is_retryable() && attempt < max_retries {
                                warn!(attempt = attempt + 1, error = %err, "Warehouse connect failed, retrying");
                                last_error = Some(err);
                                continue;
                            }
                            return Err(err);
                        }
                    };

                    match f.clone()(&mut conn) {
                        Ok(result) => return Ok(result),
                        Err(e) if e.is_retryable() && attempt < max_retries => {
                            warn!(attempt = attempt + 1, error = %e, "Warehouse query failed, retrying");
                            last_error = Some(e);
                            continue;
                        }
                        Err(e) => return Err(e.with_operation(operation)),
                    }
                }

                Err(last_error.unwrap_or_else(|| {
                    RepositoryError::internal("Max retries exceeded with no error captured")
                }))
            })
            .await
            .map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Task join error: {}", e),
                    ErrorContext::new("spawn_blocking"),
                )
            })?
        }

        /// Create the schema and tables if they do not exist yet.
        pub async fn run_migrations(&self, ctx: &QueryContext) -> RepositoryResult<usize> {
            self.with_conn("run_migrations", ctx, |conn| {
                conn.run_pending_migrations(MIGRATIONS)
                    .map(|applied| applied.len())
                    .map_err(|e| {
                        RepositoryError::internal_with_context(
                            format!("Migration failed: {}", e),
                            ErrorContext::new("run_migrations"),
                        )
                    })
            })
            .await
        }

        /// Replace every row of `domain`'s table with `rows` in one transaction.
        pub async fn overwrite_table(
            &self,
            table: &MetricTable,
            ctx: &QueryContext,
        ) -> RepositoryResult<usize> {
            let domain = table.domain;
            let rows: Vec<MetricRow> = table.rows().to_vec();
            self.with_conn("overwrite_table", ctx, move |conn| {
                conn.transaction::<_, RepositoryError, _>(|conn| {
                    sql_query(query::delete_sql(domain)).execute(conn)?;
                    let insert = query::insert_sql(domain);
                    for row in &rows {
                        sql_query(insert.as_str())
                            .bind::<Date, _>(row.date)
                            .bind::<Text, _>(row.category.as_str())
                            .bind::<Double, _>(row.value)
                            .execute(conn)?;
                    }
                    Ok(rows.len())
                })
                .map_err(|e| e.with_entity(domain.table_name()))
            })
            .await
        }
    }

    #[async_trait]
    impl MetricRepository for WarehouseRepository {
        fn repository_type(&self) -> RepositoryType {
            RepositoryType::Warehouse
        }

        async fn health_check(&self, ctx: &QueryContext) -> RepositoryResult<bool> {
            self.with_conn("health_check", ctx, |conn| {
                sql_query("SELECT 1").execute(conn)?;
                Ok(true)
            })
            .await
        }

        async fn fetch_table(
            &self,
            domain: MetricDomain,
            range: &DateRange,
            ctx: &QueryContext,
        ) -> RepositoryResult<MetricTable> {
            let started = Instant::now();
            let (start, end) = (range.start(), range.end());
            let sql = query::select_sql(domain);

            let records = self
                .with_conn("fetch_table", ctx, move |conn| {
                    sql_query(sql.as_str())
                        .bind::<Date, _>(start)
                        .bind::<Date, _>(end)
                        .load::<MetricRowRecord>(conn)
                        .map_err(|e| RepositoryError::from(e).with_entity(domain.table_name()))
                })
                .await?;

            debug!(
                domain = %domain,
                %start,
                %end,
                rows = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Fetched warehouse table"
            );

            Ok(MetricTable::from_rows(
                domain,
                records.into_iter().map(MetricRow::from).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo_config::ProfileSettings;

    fn settings() -> WarehouseSettings {
        WarehouseSettings {
            host: "warehouse.internal".into(),
            database: "analytics".into(),
            user: "svc".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_host_and_database() {
        let mut s = settings();
        s.host.clear();
        assert!(WarehouseConfig::from_settings(&s).is_err());

        let mut s = settings();
        s.database = "  ".into();
        assert!(WarehouseConfig::from_settings(&s).is_err());
    }

    #[test]
    fn test_conninfo_quotes_values() {
        let config = WarehouseConfig::from_settings(&settings()).unwrap();
        let info = config.conninfo(Some("it's\\secret"));
        assert!(info.contains("host='warehouse.internal'"));
        assert!(info.contains("port=5432"));
        assert!(info.contains("dbname='analytics'"));
        assert!(info.contains("user='svc'"));
        assert!(info.contains(r"password='it\'s\\secret'"));

        assert!(!config.conninfo(None).contains("password"));
    }

    #[test]
    fn test_profile_overrides_host_and_user() {
        let mut s = settings();
        s.profiles.insert(
            "default".into(),
            ProfileSettings {
                host: Some("dev.warehouse".into()),
                user: Some("me".into()),
                token: None,
            },
        );
        let config = WarehouseConfig::from_settings(&s).unwrap();
        assert_eq!(config.host, "dev.warehouse");
        assert_eq!(config.user, "me");

        s.hosted = true;
        let config = WarehouseConfig::from_settings(&s).unwrap();
        assert_eq!(config.host, "warehouse.internal");
        assert_eq!(config.auth, AuthStrategy::Forwarded);
    }
}
