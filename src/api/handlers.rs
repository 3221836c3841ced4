use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::stream::backup_response;
use crate::alerts::Alert;
use crate::storage::AlertStore;

/// Header carrying the number of alerts in a prefix listing
pub const ALERT_COUNT_HEADER: &str = "x-alert-count";

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn AlertStore>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Serialize)]
pub struct PutAlertResponse {
    pub id: String,
}

pub async fn put_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<Alert>,
) -> Result<(StatusCode, Json<PutAlertResponse>), ApiError> {
    if alert.id.is_empty() {
        return Err(ApiError::BadRequest("alert ID must not be empty".to_string()));
    }

    let id = alert.id.clone();
    with_store(&state, move |store| store.put_alert(alert))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(PutAlertResponse { id })))
}

pub async fn get_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let key = id.clone();
    let data = with_store(&state, move |store| store.get_alert(&key))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Alert '{}' not found", id)))?;

    Ok(json_bytes(StatusCode::OK, data))
}

pub async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete_alert(&id))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub prefix: String,
}

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let prefix = params.prefix.clone();
    match with_store(&state, move |store| store.alerts_by_prefix(&prefix)).await? {
        Ok(batch) => {
            let mut response = json_bytes(StatusCode::OK, batch.data);
            response
                .headers_mut()
                .insert(HeaderName::from_static(ALERT_COUNT_HEADER), batch.count.into());
            Ok(response)
        }
        Err(partial) => {
            tracing::warn!(
                "Prefix scan for '{}' failed after {} alerts: {}",
                params.prefix,
                partial.batch.count,
                partial.source
            );
            Err(ApiError::Internal(partial.to_string()))
        }
    }
}

pub async fn backup(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    backup_response(Arc::clone(&state.store)).await
}

/// Run a store call on the blocking pool
///
/// Store calls can wait on the write lock and fsync on commit, so they stay
/// off the async workers.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn AlertStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {}", e)))
}

fn json_bytes(status: StatusCode, data: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], data).into_response()
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
