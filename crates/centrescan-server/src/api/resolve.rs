use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use centrescan_engine::{resolve, Resolution, ResolverConfig};

use crate::api::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub name: String,
}

/// `GET /api/v1/locations/resolve?name=`
///
/// Ambiguity and not-found are structured outcomes in the payload, not
/// HTTP errors; only a blank name is rejected.
pub async fn resolve_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ApiResponse<Resolution>>, ApiError> {
    let snapshot = state.snapshot().await;
    let config = ResolverConfig::from_app_config(&state.config);

    let resolution = resolve(snapshot.as_ref(), &params.name, &config)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: resolution,
        meta: ResponseMeta::new(req_id.0),
    }))
}
