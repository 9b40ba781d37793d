mod duplicates;
mod gaps;
mod nearby;
mod resolve;
mod voice;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use centrescan_core::{AppConfig, CategoryAliases};
use centrescan_engine::{DuplicateScanner, EngineError, ScanReport, Snapshot};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Snapshot handle swapped atomically on refresh; readers clone the inner
/// `Arc` and keep a consistent view for the whole request.
pub type SharedSnapshot = Arc<RwLock<Arc<Snapshot>>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub aliases: Arc<CategoryAliases>,
    pub snapshot: SharedSnapshot,
    pub scanner: Arc<DuplicateScanner>,
    pub latest_scan: Arc<RwLock<Option<ScanReport>>>,
}

impl AppState {
    /// Current corpus view.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
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
    database: &'static str,
    snapshot_locations: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
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
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Translate an engine failure into the API error envelope.
pub(super) fn map_engine_error(request_id: String, error: &EngineError) -> ApiError {
    match error {
        EngineError::InvalidInput(msg) => {
            ApiError::new(request_id, "validation_error", msg.clone())
        }
        EngineError::UnknownLocation(id) => ApiError::new(
            request_id,
            "not_found",
            format!("no location with id {id}"),
        ),
        EngineError::Repository(e) => {
            tracing::error!(error = %e, "repository unavailable");
            ApiError::new(request_id, "internal_error", "location store unavailable")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/locations/resolve",
            get(resolve::resolve_location),
        )
        .route(
            "/api/v1/locations/{location_id}/nearby",
            get(nearby::list_nearby),
        )
        .route(
            "/api/v1/locations/{location_id}/gaps",
            post(gaps::analyze_location_gaps),
        )
        .route(
            "/api/v1/duplicates/latest",
            get(duplicates::latest_scan_report),
        )
        .route("/api/v1/duplicates/scan", post(duplicates::trigger_scan))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    // The voice platform cannot authenticate or process non-200 replies;
    // its route stays outside the protected router and encodes every
    // outcome in the body.
    let public_routes = Router::new()
        .route("/healthz", get(health))
        .route("/voice/v1/query", post(voice::voice_query));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
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
    let meta = ResponseMeta::new(req_id.0);
    let snapshot_locations = state.snapshot().await.len();

    match centrescan_db::ping(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    snapshot_locations,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        snapshot_locations,
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("conflict", StatusCode::CONFLICT),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "msg").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[test]
    fn engine_errors_map_to_api_codes() {
        let invalid = EngineError::InvalidInput("bad".to_string());
        assert_eq!(
            map_engine_error("r".to_string(), &invalid).error.code,
            "validation_error"
        );

        let unknown = EngineError::UnknownLocation(uuid::Uuid::new_v4());
        assert_eq!(
            map_engine_error("r".to_string(), &unknown).error.code,
            "not_found"
        );
    }
}
