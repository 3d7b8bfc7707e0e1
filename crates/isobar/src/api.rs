//! REST API over the configuration and dashboard operations.
//!
//! Successful responses carry `"success": true` next to the payload. Errors
//! use one envelope: `{"success": false, "error": <kind>, "message": ...,
//! "details": [...]}` with a status code derived from the error kind.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::configuration::ConfigurationApi;
use crate::dashboard::Dashboard;
use crate::error::{Error, ErrorKind};
use crate::model::SettingsUpdate;
use crate::validation::LocationCandidate;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub configuration: ConfigurationApi,
    pub dashboard: Dashboard,
}

/// Error wrapper that renders the JSON error envelope.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::invalid("query", rejection.body_text()))
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateId | ErrorKind::Capacity | ErrorKind::HomeLocationProtected => {
            StatusCode::CONFLICT
        }
        ErrorKind::UpstreamFetch => StatusCode::BAD_GATEWAY,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            log::error!("[API] {}", self.0);
        } else {
            log::debug!("[API] {}", self.0);
        }

        let mut body = json!({
            "success": false,
            "error": kind.as_str(),
            "message": self.0.to_string(),
        });
        if !self.0.violations().is_empty() {
            body["details"] = json!(self.0.violations());
        }
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// Split a comma-separated id list, dropping blanks.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdsQuery {
    ids: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    id: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    compare: Option<String>,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_locations(State(state): State<Arc<ApiState>>) -> ApiResult {
    let doc = state.configuration.list_locations().await?;
    Ok(Json(json!({
        "success": true,
        "locations": doc.locations,
        "homeLocationId": doc.settings.home_location_id,
        "dashboardLocationIds": doc.settings.dashboard_location_ids,
        "apiRefreshInterval": doc.settings.api_refresh_interval,
    })))
}

async fn add_location(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<LocationCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(candidate) = payload?;
    let location = state.configuration.add_location(candidate).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "location": location })),
    ))
}

async fn update_location(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<LocationCandidate>, JsonRejection>,
) -> ApiResult {
    let Json(candidate) = payload?;
    let location = state.configuration.update_location(candidate).await?;
    Ok(Json(json!({ "success": true, "location": location })))
}

async fn update_settings(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    let settings = state.configuration.update_settings(update).await?;
    Ok(Json(json!({
        "success": true,
        "homeLocationId": settings.home_location_id,
        "dashboardLocationIds": settings.dashboard_location_ids,
        "apiRefreshInterval": settings.api_refresh_interval,
    })))
}

async fn delete_location(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    state.configuration.delete_location(query.id.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Location deleted successfully",
    })))
}

async fn pressure(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<IdsQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let ids = split_ids(query.ids.as_deref().unwrap_or(""));
    let readings = state.dashboard.readings(&ids).await?;
    Ok(Json(json!({
        "success": true,
        "data": readings,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn pressure_history(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return Err(Error::invalid("start", "start and end dates are required").into());
    };
    let id = query.id.as_deref().unwrap_or("");
    let series = state.dashboard.history(id, start, end).await?;
    Ok(Json(json!({
        "success": true,
        "locationId": id.trim(),
        "startDate": start,
        "endDate": end,
        "time": series.time,
        "pressure": series.pressure,
    })))
}

async fn gradients(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<CompareQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let compare = query.compare.as_deref().map(split_ids);
    let snapshot = state.dashboard.current_gradients(compare).await?;
    let mut body = json!(snapshot);
    body["success"] = json!(true);
    Ok(Json(body))
}

/// Build the full router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/locations",
            get(list_locations)
                .post(add_location)
                .put(update_location)
                .patch(update_settings)
                .delete(delete_location),
        )
        .route("/api/pressure", get(pressure))
        .route("/api/pressure/history", get(pressure_history))
        .route("/api/gradients", get(gradients))
        .with_state(Arc::new(state))
}

/// Serve the API until `shutdown_rx` fires.
pub async fn serve(
    state: ApiState,
    addr: SocketAddr,
    mut shutdown_rx: tokio::sync::watch::Receiver<()>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("[API] listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
        })
        .await?;

    log::info!("[API] stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldViolation;

    #[test]
    fn test_split_ids() {
        assert_eq!(split_ids("dag,las"), vec!["dag", "las"]);
        assert_eq!(split_ids(" dag , ,las,"), vec!["dag", "las"]);
        assert!(split_ids("").is_empty());
        assert!(split_ids(",,").is_empty());
    }

    #[test]
    fn test_status_for_each_kind() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::DuplicateId), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Capacity), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::HomeLocationProtected), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::UpstreamFetch), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Persistence), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_status() {
        let resp = ApiError(Error::HomeLocationProtected("sna".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ApiError(Error::Validation(vec![FieldViolation::new("id", "required")]))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
