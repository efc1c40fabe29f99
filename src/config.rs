use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Schema qualifier used in query text; rewritten to the configured alias.
pub const DEFAULT_SCHEMA: &str = "ichigo";

pub const REQUIRED_VARIABLES: [&str; 5] = ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASSWORD"];

/// Logical databases the dashboard is allowed to target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalDatabase {
    #[default]
    Ichigo,
    Asterdex,
}

impl LogicalDatabase {
    pub const ALL: [LogicalDatabase; 2] = [LogicalDatabase::Ichigo, LogicalDatabase::Asterdex];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalDatabase::Ichigo => "ichigo",
            LogicalDatabase::Asterdex => "asterdex",
        }
    }
}

impl fmt::Display for LogicalDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalDatabase {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ichigo" => Ok(LogicalDatabase::Ichigo),
            "asterdex" => Ok(LogicalDatabase::Asterdex),
            other => Err(DashboardError::InvalidDatabase(other.to_string())),
        }
    }
}

/// Connection pool tuning
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Environment-sourced settings.
///
/// Required database variables are kept optional here so the process can start
/// with an incomplete environment and report the gap through the stats endpoint.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub db_host: Option<String>,
    pub db_port: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub schema: String,
    pub pool: PoolSettings,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let schema = get("DB_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        if !is_sql_identifier(&schema) {
            return Err(DashboardError::InvalidConfiguration(format!(
                "DB_SCHEMA must be a plain identifier, got '{}'",
                schema
            )));
        }

        let defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: parse_var(&get, "DB_POOL_MAX", defaults.max_connections)?,
            acquire_timeout: Duration::from_secs(parse_var(
                &get,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),
            idle_timeout: Duration::from_secs(parse_var(
                &get,
                "DB_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )?),
        };

        Ok(Self {
            db_host: get("DB_HOST"),
            db_port: get("DB_PORT"),
            db_name: get("DB_NAME"),
            db_user: get("DB_USER"),
            db_password: get("DB_PASSWORD"),
            schema,
            pool,
            port: parse_var(&get, "PORT", 3000)?,
        })
    }

    /// Required variables that are absent, in declaration order.
    pub fn missing_variables(&self) -> Vec<String> {
        let values = [
            &self.db_host,
            &self.db_port,
            &self.db_name,
            &self.db_user,
            &self.db_password,
        ];

        REQUIRED_VARIABLES
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn ensure_complete(&self) -> Result<(), DashboardError> {
        let missing = self.missing_variables();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DashboardError::MissingConfiguration(missing))
        }
    }

    /// Presence check plus the values that can be validated without IO.
    pub fn ensure_usable(&self) -> Result<(), DashboardError> {
        self.ensure_complete()?;
        self.port_number()?;
        Ok(())
    }

    /// Database used when a request does not select one.
    pub fn default_database(&self) -> LogicalDatabase {
        self.db_name
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }

    pub fn port_number(&self) -> Result<u16, DashboardError> {
        let raw = self
            .db_port
            .as_deref()
            .ok_or_else(|| DashboardError::MissingConfiguration(vec!["DB_PORT".to_string()]))?;

        raw.parse().map_err(|_| {
            DashboardError::InvalidConfiguration(format!("DB_PORT is not a valid port: '{}'", raw))
        })
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T, DashboardError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            DashboardError::InvalidConfiguration(format!("{} has an invalid value: '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

fn is_sql_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, DashboardError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_complete_environment_has_no_missing_variables() {
        let settings = settings_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "asterdex"),
            ("DB_USER", "bot"),
            ("DB_PASSWORD", "secret"),
        ])
        .unwrap();

        assert!(settings.missing_variables().is_empty());
        assert_eq!(settings.schema, "ichigo");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.default_database(), LogicalDatabase::Asterdex);
        assert_eq!(settings.port_number().unwrap(), 5432);
    }

    #[test]
    fn test_missing_password_is_reported_alone() {
        let settings = settings_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "ichigo"),
            ("DB_USER", "bot"),
            ("DB_PASSWORD", "  "),
        ])
        .unwrap();

        assert_eq!(settings.missing_variables(), vec!["DB_PASSWORD".to_string()]);
        assert!(matches!(
            settings.ensure_complete(),
            Err(DashboardError::MissingConfiguration(ref vars)) if vars == &["DB_PASSWORD".to_string()]
        ));
    }

    #[test]
    fn test_non_numeric_port_is_unusable() {
        let settings = settings_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "postgres"),
            ("DB_NAME", "ichigo"),
            ("DB_USER", "bot"),
            ("DB_PASSWORD", "secret"),
        ])
        .unwrap();

        assert!(settings.ensure_complete().is_ok());
        assert!(matches!(
            settings.ensure_usable(),
            Err(DashboardError::InvalidConfiguration(ref msg)) if msg.contains("DB_PORT")
        ));
    }

    #[test]
    fn test_unknown_db_name_falls_back_to_primary() {
        let settings = settings_from(&[("DB_NAME", "production")]).unwrap();
        assert_eq!(settings.default_database(), LogicalDatabase::Ichigo);
    }

    #[test]
    fn test_schema_alias_must_be_identifier() {
        assert!(settings_from(&[("DB_SCHEMA", "astro_v2")]).is_ok());
        assert!(matches!(
            settings_from(&[("DB_SCHEMA", "x; DROP TABLE orders")]),
            Err(DashboardError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_pool_overrides() {
        let settings = settings_from(&[("DB_POOL_MAX", "5"), ("DB_ACQUIRE_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(settings.pool.max_connections, 5);
        assert_eq!(settings.pool.acquire_timeout, Duration::from_secs(3));
        assert_eq!(settings.pool.idle_timeout, Duration::from_secs(30));

        assert!(settings_from(&[("DB_POOL_MAX", "many")]).is_err());
    }

    #[test]
    fn test_logical_database_parsing() {
        assert_eq!("ichigo".parse::<LogicalDatabase>().unwrap(), LogicalDatabase::Ichigo);
        assert_eq!("asterdex".parse::<LogicalDatabase>().unwrap(), LogicalDatabase::Asterdex);
        assert!(matches!(
            "postgres".parse::<LogicalDatabase>(),
            Err(DashboardError::InvalidDatabase(ref name)) if name == "postgres"
        ));
    }
}
