use std::{
    path::{Path as StdPath, PathBuf},
    sync::Arc,
};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::to_value;
use tracing::error;

use talentflow_storage::Database;

use crate::envelope::{ApiError, ApiResponse};
use crate::{intake, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    upload_dir: Arc<PathBuf>,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, upload_dir: PathBuf) -> Self {
        Self {
            metrics,
            storage,
            upload_dir: Arc::new(upload_dir),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn upload_dir(&self) -> &StdPath {
        &self.upload_dir
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(
            "/companies",
            post(intake::register_company).get(list_companies),
        )
        .route("/companies/:id", get(fetch_company))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}

async fn fetch_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    let company = state
        .storage()
        .companies()
        .fetch(&id)
        .await
        .map_err(|err| read_failure("fetch", ApiError::from(err)))?;

    counter!("company_read_requests_total", "endpoint" => "fetch", "result" => "ok").increment(1);
    let data = to_value(&company).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(ApiResponse::ok(data))
}

async fn list_companies(State(state): State<AppState>) -> Result<ApiResponse, ApiError> {
    let companies = state
        .storage()
        .companies()
        .list()
        .await
        .map_err(|err| read_failure("list", ApiError::from(err)))?;

    // An empty store is reported as 404 rather than an empty 200 list.
    if companies.is_empty() {
        return Err(read_failure("list", ApiError::NotFound("no companies found")));
    }

    counter!("company_read_requests_total", "endpoint" => "list", "result" => "ok").increment(1);
    let data = to_value(&companies).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(ApiResponse::ok(data))
}

fn read_failure(endpoint: &'static str, err: ApiError) -> ApiError {
    if matches!(err, ApiError::Internal(_)) {
        error!(stage = "read", endpoint, error = %err, "company read failed");
    }
    counter!("company_read_requests_total", "endpoint" => endpoint, "result" => err.as_str())
        .increment(1);
    err
}
