mod ask;
mod nodes;
mod reload;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use geomesh_assistant::{AssistantClient, AssistantError};
use geomesh_core::AppConfig;
use geomesh_index::{IndexError, IndexHandle, NodeResolver};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub resolver: NodeResolver,
    pub assistant: Option<Arc<AssistantClient>>,
    pub dataset_path: Arc<PathBuf>,
    pub signal_radius_km: f64,
}

impl AppState {
    pub fn from_config(
        config: &AppConfig,
        index: Arc<IndexHandle>,
        assistant: Option<AssistantClient>,
    ) -> Self {
        Self {
            index,
            resolver: NodeResolver::new(),
            assistant: assistant.map(Arc::new),
            dataset_path: Arc::new(config.dataset_path.clone()),
            signal_radius_km: config.signal_radius_km,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    nodes: usize,
    assistant: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "dataset_error" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "assistant_error" => StatusCode::BAD_GATEWAY,
            "index_unavailable" | "assistant_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_index_error(request_id: String, error: &IndexError) -> ApiError {
    match error {
        IndexError::InvalidCoordinate { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        IndexError::EmptyIndex | IndexError::EmptyDataset => {
            tracing::warn!(error = %error, "lookup against an empty index");
            ApiError::new(request_id, "index_unavailable", "no nodes are indexed")
        }
    }
}

pub(super) fn map_assistant_error(request_id: String, error: &AssistantError) -> ApiError {
    match error {
        AssistantError::EmptyQuestion => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        AssistantError::MissingApiKey => {
            ApiError::new(request_id, "assistant_unavailable", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "assistant request failed");
            ApiError::new(request_id, "assistant_error", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/nodes", get(nodes::list_nodes))
        .route("/api/v1/nearest", get(nodes::nearest))
        .route("/api/v1/index/reload", post(reload::reload_index));

    let limited_routes = Router::new()
        .route("/api/v1/ask", post(ask::ask))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(limited_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let nodes = state.index.snapshot().len();
    let assistant = if state.assistant.is_some() {
        "configured"
    } else {
        "offline_only"
    };

    let (status, label) = if nodes > 0 {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("health check: index is empty");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(ApiResponse::new(
            HealthData {
                status: label,
                nodes,
                assistant,
            },
            req_id.0,
        )),
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
