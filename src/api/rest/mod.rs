pub mod inspections;
pub mod middleware;
pub mod notifications;
pub mod pagination;
pub mod stats;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(notifications::router())
        .merge(inspections::router())
        .merge(stats::router())
        .route("/health", get(health).fallback(endpoint_not_found));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics).fallback(endpoint_not_found))
        .fallback(endpoint_not_found)
        .with_state(state.clone())
        .layer(CatchPanicLayer::custom(middleware::handle_panic));

    if !state.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::expose_error_detail));
    }

    app.layer(axum::middleware::from_fn_with_state(
        state,
        middleware::track_requests,
    ))
}

/// Permissive unless a single allowed origin is configured.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, AppError> {
    match origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|err| AppError::Config(format!("invalid CORS_ORIGIN: {err}")))?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message: Some(message),
            data,
        }
    }
}

/// Parses an optional enumeration filter from the query string. Blank means
/// no constraint; an unknown value is a client error.
pub(crate) fn parse_filter<E: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<E>, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid {name} filter: {value}"))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    uptime_seconds: f64,
    environment: String,
    database: DatabaseHealth,
}

#[derive(Serialize)]
struct DatabaseHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = tokio::time::timeout(HEALTH_PROBE_TIMEOUT, state.store.ping()).await;
    let error = match probe {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(_) => Some("store ping timed out".to_string()),
    };

    if let Some(err) = &error {
        warn!(error = %err, "health probe failed");
    }

    let (status, label, database) = match error {
        None => (
            StatusCode::OK,
            "OK",
            DatabaseHealth {
                status: "connected",
                error: None,
            },
        ),
        Some(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "DEGRADED",
            DatabaseHealth {
                status: "disconnected",
                error: Some(err),
            },
        ),
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            timestamp: Utc::now(),
            uptime_seconds: state.started_at.elapsed().as_secs_f64(),
            environment: state.environment.clone(),
            database,
        }),
    )
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

/// Answers unknown paths and unsupported methods on known paths alike.
pub(crate) async fn endpoint_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "success": false, "error": "Endpoint not found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::{cors_layer, parse_filter};
    use crate::error::AppError;
    use crate::models::notification::NotificationStatus;

    #[test]
    fn blank_filter_is_ignored() {
        let parsed: Option<NotificationStatus> = parse_filter("status", Some("  ")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn known_filter_value_parses() {
        let parsed: Option<NotificationStatus> = parse_filter("status", Some("arrived")).unwrap();
        assert_eq!(parsed, Some(NotificationStatus::Arrived));
    }

    #[test]
    fn unknown_filter_value_is_a_bad_request() {
        let parsed = parse_filter::<NotificationStatus>("status", Some("lost"));
        assert!(matches!(parsed, Err(AppError::BadRequest(msg)) if msg.contains("lost")));
    }

    #[test]
    fn cors_origin_must_be_a_valid_header() {
        assert!(cors_layer(Some("https://dispatch.example.com")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
        assert!(cors_layer(None).is_ok());
    }
}
