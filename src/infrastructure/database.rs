use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::{LogicalDatabase, Settings, DEFAULT_SCHEMA};
use crate::error::{DashboardError, DashboardResult};

/// Bound query parameter
#[derive(Debug, Clone)]
pub enum SqlParam {
    Int(i64),
    TextArray(Vec<String>),
}

/// One lazily created connection pool per logical database.
///
/// Built once at startup and shared behind an `Arc`; `close_all` tears the
/// pools down on shutdown.
pub struct DatabaseRegistry {
    settings: Settings,
    pools: RwLock<HashMap<LogicalDatabase, PgPool>>,
}

impl DatabaseRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get or create the pool for `database`.
    pub async fn connect(&self, database: LogicalDatabase) -> DashboardResult<PgPool> {
        if let Some(pool) = self.pools.read().await.get(&database) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().await;
        if let Some(pool) = pools.get(&database) {
            return Ok(pool.clone());
        }

        let options = self.connect_options(database)?;
        let pool = PgPoolOptions::new()
            .max_connections(self.settings.pool.max_connections)
            .acquire_timeout(self.settings.pool.acquire_timeout)
            .idle_timeout(Some(self.settings.pool.idle_timeout))
            .connect_lazy_with(options);

        info!(
            "Created connection pool for {} (max {} connections)",
            database, self.settings.pool.max_connections
        );

        pools.insert(database, pool.clone());
        Ok(pool)
    }

    fn connect_options(&self, database: LogicalDatabase) -> DashboardResult<PgConnectOptions> {
        self.settings.ensure_complete()?;

        let host = required(&self.settings.db_host, "DB_HOST")?;
        let user = required(&self.settings.db_user, "DB_USER")?;
        let password = required(&self.settings.db_password, "DB_PASSWORD")?;
        let port = self.settings.port_number()?;

        Ok(PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(user)
            .password(password)
            .database(database.as_str()))
    }

    /// Round-trip `SELECT NOW()` and return the server clock.
    pub async fn ping(&self, database: LogicalDatabase) -> DashboardResult<DateTime<Utc>> {
        let pool = self.connect(database).await?;

        sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&pool)
            .await
            .map_err(|source| DashboardError::Connection {
                database: database.to_string(),
                source,
            })
    }

    /// Connectivity probe. Never fails; the cause is logged instead.
    pub async fn health_check(&self, database: LogicalDatabase) -> bool {
        match self.ping(database).await {
            Ok(now) => {
                debug!("Database {} reachable, server time {}", database, now);
                true
            }
            Err(e) => {
                error!("Database {} health check failed: {}", database, e);
                false
            }
        }
    }

    pub async fn fetch_all<T>(
        &self,
        database: LogicalDatabase,
        sql: &str,
        params: &[SqlParam],
    ) -> DashboardResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let pool = self.connect(database).await?;
        let sql = apply_schema_alias(sql, &self.settings.schema);

        bind_all(sqlx::query_as::<_, T>(&sql), params)
            .fetch_all(&pool)
            .await
            .map_err(|source| query_error(database, source))
    }

    pub async fn fetch_optional<T>(
        &self,
        database: LogicalDatabase,
        sql: &str,
        params: &[SqlParam],
    ) -> DashboardResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let pool = self.connect(database).await?;
        let sql = apply_schema_alias(sql, &self.settings.schema);

        bind_all(sqlx::query_as::<_, T>(&sql), params)
            .fetch_optional(&pool)
            .await
            .map_err(|source| query_error(database, source))
    }

    pub async fn fetch_one<T>(
        &self,
        database: LogicalDatabase,
        sql: &str,
        params: &[SqlParam],
    ) -> DashboardResult<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let pool = self.connect(database).await?;
        let sql = apply_schema_alias(sql, &self.settings.schema);

        bind_all(sqlx::query_as::<_, T>(&sql), params)
            .fetch_one(&pool)
            .await
            .map_err(|source| query_error(database, source))
    }

    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (database, pool) in pools.drain() {
            pool.close().await;
            info!("Closed connection pool for {}", database);
        }
    }
}

/// Rewrite the `ichigo.` schema qualifier to the configured alias.
pub fn apply_schema_alias(sql: &str, schema: &str) -> String {
    if schema == DEFAULT_SCHEMA {
        return sql.to_string();
    }
    sql.replace(&format!("{}.", DEFAULT_SCHEMA), &format!("{}.", schema))
}

fn bind_all<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::TextArray(values) => query.bind(values.clone()),
        };
    }
    query
}

fn required<'a>(value: &'a Option<String>, name: &str) -> DashboardResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| DashboardError::MissingConfiguration(vec![name.to_string()]))
}

fn query_error(database: LogicalDatabase, source: sqlx::Error) -> DashboardError {
    error!("Query error on {}: {}", database, source);
    DashboardError::Query {
        database: database.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_settings() -> Settings {
        Settings {
            db_host: Some("localhost".to_string()),
            db_port: Some("5432".to_string()),
            db_name: Some("ichigo".to_string()),
            db_user: Some("bot".to_string()),
            db_password: Some("secret".to_string()),
            schema: DEFAULT_SCHEMA.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_schema_alias_rewrites_every_qualifier() {
        let sql = "SELECT * FROM ichigo.orders o JOIN ichigo.decisions d ON true";
        assert_eq!(
            apply_schema_alias(sql, "asterdex"),
            "SELECT * FROM asterdex.orders o JOIN asterdex.decisions d ON true"
        );
    }

    #[test]
    fn test_default_schema_leaves_text_untouched() {
        let sql = "SELECT 1 FROM ichigo.decisions";
        assert_eq!(apply_schema_alias(sql, "ichigo"), sql);
    }

    #[tokio::test]
    async fn test_connect_without_password_is_configuration_error() {
        let settings = Settings {
            db_password: None,
            ..complete_settings()
        };
        let registry = DatabaseRegistry::new(settings);

        let err = registry.connect(LogicalDatabase::Ichigo).await.unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingConfiguration(ref vars) if vars == &["DB_PASSWORD".to_string()]
        ));
        assert!(!registry.health_check(LogicalDatabase::Ichigo).await);
    }

    #[tokio::test]
    async fn test_connect_reuses_pool_per_database() {
        let registry = DatabaseRegistry::new(complete_settings());

        registry.connect(LogicalDatabase::Ichigo).await.unwrap();
        registry.connect(LogicalDatabase::Ichigo).await.unwrap();
        registry.connect(LogicalDatabase::Asterdex).await.unwrap();

        assert_eq!(registry.pools.read().await.len(), 2);

        registry.close_all().await;
        assert!(registry.pools.read().await.is_empty());
    }
}
