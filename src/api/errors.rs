use axum::{
    extract::rejection::QueryRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::dto::ErrorResponse;
use crate::config::LogicalDatabase;
use crate::error::DashboardError;

pub const NO_STORE: &str = "no-store, max-age=0";

/// Failures as the dashboard sees them: `{error, details, message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Unsupported database selector
    BadRequest(String),
    /// Query string that does not deserialize
    InvalidQuery(String),
    /// Required variables absent
    Configuration(Vec<String>),
    InvalidConfiguration(String),
    Connection(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorResponse {
        let (error, details, message) = match self {
            ApiError::BadRequest(name) => {
                let allowed: Vec<&str> = LogicalDatabase::ALL.iter().map(|db| db.as_str()).collect();
                (
                    "Invalid Database",
                    format!(
                        "Unsupported database '{}'. Expected one of: {}",
                        name,
                        allowed.join(", ")
                    ),
                    "Select one of the supported databases",
                )
            }
            ApiError::InvalidQuery(details) => (
                "Invalid Request",
                details,
                "Use ?database=<name> and an optional numeric limit",
            ),
            ApiError::Configuration(missing) => (
                "Configuration Error",
                format!("Missing environment variables: {}", missing.join(", ")),
                "Please configure database environment variables",
            ),
            ApiError::InvalidConfiguration(details) => (
                "Configuration Error",
                details,
                "Please fix the database environment variables",
            ),
            ApiError::Connection(details) => (
                "Database Connection Failed",
                details,
                "Check database credentials and network access",
            ),
            ApiError::Internal(details) => (
                "Failed to fetch dashboard statistics",
                details,
                "Internal server error occurred",
            ),
        };

        ErrorResponse {
            error: error.to_string(),
            details,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(self.body()),
        )
            .into_response()
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::InvalidDatabase(name) => ApiError::BadRequest(name),
            DashboardError::MissingConfiguration(missing) => ApiError::Configuration(missing),
            DashboardError::InvalidConfiguration(details) => ApiError::InvalidConfiguration(details),
            DashboardError::Connection { .. } => {
                ApiError::Connection("Could not connect to PostgreSQL database".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configuration_body() {
        let err = ApiError::from(DashboardError::MissingConfiguration(vec![
            "DB_USER".to_string(),
            "DB_PASSWORD".to_string(),
        ]));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.body();
        assert_eq!(body.error, "Configuration Error");
        assert_eq!(body.details, "Missing environment variables: DB_USER, DB_PASSWORD");
    }

    #[test]
    fn test_invalid_database_is_bad_request() {
        let err = ApiError::from(DashboardError::InvalidDatabase("prod".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.body().details.contains("'prod'"));
    }

    #[test]
    fn test_malformed_row_is_internal() {
        let err = ApiError::from(DashboardError::MalformedRow {
            query: "recent_trades",
            field: "pnl_usdt",
            value: "abc".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body().details.contains("recent_trades.pnl_usdt"));
    }
}
