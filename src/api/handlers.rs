use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::api::{dto::*, errors::ApiError, errors::NO_STORE};
use crate::config::{LogicalDatabase, Settings};
use crate::infrastructure::DatabaseRegistry;
use crate::services::{StatsAggregator, RECENT_LIMIT};

const MAX_TRADES_LIMIT: i64 = 500;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DatabaseRegistry>,
    pub aggregator: StatsAggregator,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(DatabaseRegistry::new(settings));
        Self {
            aggregator: StatsAggregator::new(Arc::clone(&registry)),
            registry,
        }
    }
}

/// Allow-listed database selector; omitted means the configured default.
fn resolve_database(state: &AppState, requested: Option<&str>) -> Result<LogicalDatabase, ApiError> {
    match requested {
        Some(name) => name.parse::<LogicalDatabase>().map_err(|e| {
            warn!("Rejected database selector: {}", e);
            ApiError::from(e)
        }),
        None => Ok(state.registry.settings().default_database()),
    }
}

fn reject_query(rejection: QueryRejection) -> ApiError {
    warn!("Rejected query string: {}", rejection.body_text());
    ApiError::from(rejection)
}

fn ensure_configured(state: &AppState) -> Result<(), ApiError> {
    state.registry.settings().ensure_usable().map_err(|e| {
        error!("{}", e);
        ApiError::from(e)
    })
}

async fn ensure_reachable(state: &AppState, database: LogicalDatabase) -> Result<(), ApiError> {
    if state.registry.health_check(database).await {
        Ok(())
    } else {
        Err(ApiError::Connection(format!(
            "Could not connect to PostgreSQL database '{}'",
            database
        )))
    }
}

fn no_store<T: serde::Serialize>(body: T) -> Response {
    ([(header::CACHE_CONTROL, NO_STORE)], Json(body)).into_response()
}

/// GET /health - Health check
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthDto>) {
    let mut databases = BTreeMap::new();

    if state.registry.settings().ensure_usable().is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthDto {
                status: "misconfigured".to_string(),
                service: "astro-dashboard-backend".to_string(),
                databases,
            }),
        );
    }

    for database in LogicalDatabase::ALL {
        let healthy = state.registry.health_check(database).await;
        databases.insert(database.to_string(), healthy);
    }

    let all_healthy = databases.values().all(|healthy| *healthy);
    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthDto {
            status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
            service: "astro-dashboard-backend".to_string(),
            databases,
        }),
    )
}

/// GET /stats - Full dashboard snapshot
pub async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(reject_query)?;
    let database = resolve_database(&state, query.database.as_deref())?;
    ensure_configured(&state)?;
    ensure_reachable(&state, database).await?;

    let snapshot = state
        .aggregator
        .get_dashboard_stats(database)
        .await
        .map_err(|e| {
            error!("Error fetching dashboard stats from {}: {}", database, e);
            ApiError::Internal(e.to_string())
        })?;

    Ok(no_store(DashboardSnapshotDto::from(snapshot)))
}

/// GET /trades - Recent closed round-trips
pub async fn get_trades(
    State(state): State<AppState>,
    query: Result<Query<TradesQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(reject_query)?;
    let database = resolve_database(&state, query.database.as_deref())?;
    let limit = query.limit.unwrap_or(RECENT_LIMIT).clamp(1, MAX_TRADES_LIMIT);
    ensure_configured(&state)?;
    ensure_reachable(&state, database).await?;

    let trades = state
        .aggregator
        .repository()
        .recent_trades(database, limit)
        .await
        .map_err(|e| {
            error!("Error fetching trades from {}: {}", database, e);
            ApiError::Internal(e.to_string())
        })?;

    let dtos: Vec<TradeDto> = trades.into_iter().map(TradeDto::from).collect();
    Ok(no_store(dtos))
}
