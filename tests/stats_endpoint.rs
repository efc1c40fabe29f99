use anyhow::Result;
use astro_dashboard_backend::api::dto::{ErrorResponse, HealthDto};
use astro_dashboard_backend::{create_router, AppState, Settings};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use astro_dashboard_backend::config::PoolSettings;
use axum::Router;
use std::time::Duration;
use tower::ServiceExt;

fn settings_without_password() -> Settings {
    Settings {
        db_host: Some("localhost".to_string()),
        db_port: Some("5432".to_string()),
        db_name: Some("ichigo".to_string()),
        db_user: Some("bot".to_string()),
        db_password: None,
        schema: "ichigo".to_string(),
        ..Settings::default()
    }
}

fn settings_with_unreachable_server() -> Settings {
    Settings {
        db_host: Some("127.0.0.1".to_string()),
        db_port: Some("1".to_string()),
        db_password: Some("secret".to_string()),
        pool: PoolSettings {
            max_connections: 2,
            acquire_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(30),
        },
        ..settings_without_password()
    }
}

fn app(settings: Settings) -> Router {
    create_router(AppState::new(settings))
}

async fn get(app: Router, uri: &str) -> Result<(StatusCode, Option<String>, Vec<u8>)> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;

    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await?;

    Ok((status, cache_control, body.to_vec()))
}

#[tokio::test]
async fn test_unknown_database_is_rejected_before_any_connection() -> Result<()> {
    let (status, cache_control, body) = get(app(Settings::default()), "/stats?database=prod").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache_control.as_deref(), Some("no-store, max-age=0"));

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Invalid Database");
    assert!(error.details.contains("ichigo, asterdex"));
    Ok(())
}

#[tokio::test]
async fn test_empty_database_selector_is_rejected() -> Result<()> {
    let (status, _, _) = get(app(settings_without_password()), "/stats?database=").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_missing_password_reports_configuration_error() -> Result<()> {
    let (status, cache_control, body) =
        get(app(settings_without_password()), "/stats?database=asterdex").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cache_control.as_deref(), Some("no-store, max-age=0"));

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Configuration Error");
    assert_eq!(error.details, "Missing environment variables: DB_PASSWORD");
    Ok(())
}

#[tokio::test]
async fn test_api_stats_alias_behaves_like_stats() -> Result<()> {
    let (status, _, body) = get(app(Settings::default()), "/api/stats").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Configuration Error");
    assert_eq!(
        error.details,
        "Missing environment variables: DB_HOST, DB_PORT, DB_NAME, DB_USER, DB_PASSWORD"
    );
    Ok(())
}

#[tokio::test]
async fn test_health_reports_misconfigured() -> Result<()> {
    let (status, _, body) = get(app(settings_without_password()), "/health").await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let health: HealthDto = serde_json::from_slice(&body)?;
    assert_eq!(health.status, "misconfigured");
    assert!(health.databases.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_trades_validates_database_selector() -> Result<()> {
    let (status, _, body) = get(app(settings_without_password()), "/trades?database=binance&limit=10").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Invalid Database");
    Ok(())
}

#[tokio::test]
async fn test_trades_without_configuration_is_error() -> Result<()> {
    let (status, _, body) = get(app(settings_without_password()), "/trades?limit=5000").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Configuration Error");
    Ok(())
}

#[tokio::test]
async fn test_non_numeric_limit_gets_structured_bad_request() -> Result<()> {
    let (status, cache_control, body) = get(app(settings_without_password()), "/trades?limit=abc").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache_control.as_deref(), Some("no-store, max-age=0"));

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Invalid Request");
    assert!(error.details.contains("invalid digit"));
    Ok(())
}

#[tokio::test]
async fn test_repeated_database_key_gets_structured_bad_request() -> Result<()> {
    let (status, _, body) =
        get(app(settings_without_password()), "/stats?database=ichigo&database=asterdex").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Invalid Request");
    assert!(error.details.contains("database"));
    Ok(())
}

#[tokio::test]
async fn test_non_numeric_db_port_is_configuration_error() -> Result<()> {
    let settings = Settings {
        db_port: Some("postgres".to_string()),
        ..settings_with_unreachable_server()
    };
    let (status, _, body) = get(app(settings), "/stats").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Configuration Error");
    assert!(error.details.contains("DB_PORT"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_database_reports_connection_failure() -> Result<()> {
    let (status, cache_control, body) =
        get(app(settings_with_unreachable_server()), "/stats?database=ichigo").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cache_control.as_deref(), Some("no-store, max-age=0"));

    let error: ErrorResponse = serde_json::from_slice(&body)?;
    assert_eq!(error.error, "Database Connection Failed");
    assert_eq!(error.details, "Could not connect to PostgreSQL database 'ichigo'");
    Ok(())
}
