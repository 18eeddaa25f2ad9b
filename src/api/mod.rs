//! REST API for lookups, reports and the session history

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::config::ApiKeys;
use crate::error::{ProviderError, ReportError};
use crate::history::{self, ExportFormat};
use crate::models::{
    AggregateReport, LookupRequest, ReportRequest, RequestLog, SessionStats, StoreKeyRequest,
};
use crate::providers::{ProviderId, ProviderRegistry, ServiceInfo};
use crate::report::{ReportGenerator, UNKNOWN_SERVICE};
use crate::session::Session;

type ApiError = (StatusCode, Json<Value>);

/// Application state shared across handlers
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub reports: ReportGenerator,
    pub session: RwLock<Session>,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Provider catalog and lookups
        .route("/api/v1/services", get(list_services))
        .route("/api/v1/lookup/:service", post(lookup))
        .route("/api/v1/report", post(generate_report))

        // Session history
        .route("/api/v1/history", get(list_history).delete(clear_history))
        .route("/api/v1/history/export", get(export_history))
        .route("/api/v1/history/import", post(import_history))

        // Session key store
        .route("/api/v1/keys/:service", put(store_key).delete(remove_key))

        // Statistics
        .route("/api/v1/stats", get(get_stats))

        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn parse_service(service: &str) -> Result<ProviderId, ApiError> {
    service
        .parse()
        .map_err(|_| error_response(StatusCode::NOT_FOUND, UNKNOWN_SERVICE))
}

fn validate(req: &impl Validate) -> Result<(), ApiError> {
    req.validate()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

/// HTTP status for a failed provider call
fn provider_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::MissingKey { .. } | ProviderError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ProviderError::VendorHttp { .. } | ProviderError::Decode { .. } => StatusCode::BAD_GATEWAY,
        ProviderError::Network { .. } | ProviderError::Timeout { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
    }
}

// ==================== Handlers ====================

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "zeroshark",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<ServiceInfo>> {
    Json(state.registry.catalog())
}

async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_service(&service)?;
    validate(&req)?;

    let mut overrides = ApiKeys::new();
    if let Some(key) = &req.api_key {
        overrides.insert(id, key.as_str());
    }
    let keys = state.session.read().await.keys(&overrides);

    // No lock is held while the vendor call is in flight
    let result = state.registry.call(id, &req.input, &keys).await;
    state
        .session
        .write()
        .await
        .record_lookup(id, &req.input, &result);

    result.map(Json).map_err(|e| {
        tracing::warn!(provider = id.as_str(), error = %e, "Lookup failed");
        error_response(provider_status(&e), e.to_string())
    })
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<AggregateReport>, ApiError> {
    validate(&req)?;

    let keys = state
        .session
        .read()
        .await
        .keys(&ApiKeys::from_map(&req.api_keys));

    state
        .reports
        .generate_report(&req.indicator, &req.services, &keys)
        .await
        .map(Json)
        .map_err(|e| match e {
            ReportError::InvalidRequest(reason) => error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid report request: {reason}"),
            ),
            ReportError::GenerationFailed { message, raw_data } => (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": format!("Report generation failed: {message}"),
                    "rawData": raw_data,
                })),
            ),
        })
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    q: Option<String>,
}

async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<RequestLog>> {
    let session = state.session.read().await;
    let logs = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => session.history().search(q),
        _ => session.history().entries().to_vec(),
    };
    Json(logs)
}

async fn clear_history(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.write().await.history_mut().clear();
    tracing::info!("History cleared");
    StatusCode::NO_CONTENT
}

/// `format` wins; otherwise the extension of `filename`; otherwise JSON
#[derive(Debug, Deserialize)]
struct FormatQuery {
    format: Option<String>,
    filename: Option<String>,
}

impl FormatQuery {
    fn format(&self) -> Result<ExportFormat, ApiError> {
        let format = match (self.format.as_deref(), self.filename.as_deref()) {
            (Some(format), _) => format.parse::<ExportFormat>(),
            (None, Some(name)) => ExportFormat::from_file_name(name),
            (None, None) => Ok(ExportFormat::Json),
        };
        format.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
    }
}

async fn export_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FormatQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = query.format()?;
    let session = state.session.read().await;

    let body = history::export(session.history().entries(), format).map_err(|e| {
        tracing::error!(error = %e, "Failed to export history");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        body,
    ))
}

async fn import_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FormatQuery>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let format = query.format()?;

    let logs = history::import(&body, format).map_err(|e| {
        tracing::warn!(error = %e, "Rejected history import");
        error_response(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let imported = logs.len();
    state.session.write().await.history_mut().replace(logs);
    tracing::info!(imported, "History imported");

    Ok(Json(json!({ "imported": imported })))
}

async fn store_key(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    Json(req): Json<StoreKeyRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_service(&service)?;
    validate(&req)?;

    state.session.write().await.store_key(id, req.api_key);
    tracing::info!(provider = id.as_str(), "API key stored");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_key(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_service(&service)?;

    if state.session.write().await.remove_key(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(
            StatusCode::NOT_FOUND,
            format!("No stored key for {}", id.display_name()),
        ))
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<SessionStats> {
    Json(state.session.read().await.stats())
}
