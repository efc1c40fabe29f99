use thiserror::Error;

/// Failures surfaced by the accessor and the aggregator.
///
/// Nothing below the HTTP boundary retries or substitutes fallback values;
/// every variant travels up to `api::errors::ApiError`.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingConfiguration(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported database '{0}'")]
    InvalidDatabase(String),

    #[error("Could not connect to database {database}: {source}")]
    Connection {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query on database {database} failed: {source}")]
    Query {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Malformed value in {query}.{field}: '{value}'")]
    MalformedRow {
        query: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Calculation(err.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
