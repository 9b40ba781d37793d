use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use centrescan_engine::{
    analyze_gaps, find_nearby, DetailLevel, GapConfig, GapReport, NearbyFilters,
};

use crate::api::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

const DEFAULT_NEIGHBORHOOD_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct GapRequest {
    /// Explicit competitor set. When omitted the neighborhood is derived
    /// from a radius query around the target.
    pub competitor_ids: Option<Vec<Uuid>>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub detail: DetailLevel,
}

/// `POST /api/v1/locations/{location_id}/gaps`
pub async fn analyze_location_gaps(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(location_id): Path<Uuid>,
    Json(request): Json<GapRequest>,
) -> Result<Json<ApiResponse<GapReport>>, ApiError> {
    let snapshot = state.snapshot().await;

    let competitor_ids = match request.competitor_ids {
        Some(ids) => ids,
        None => {
            let radius_km = request.radius_km.unwrap_or(DEFAULT_NEIGHBORHOOD_RADIUS_KM);
            let filters = NearbyFilters::with_limit_from(&state.config);
            find_nearby(snapshot.as_ref(), location_id, radius_km, &filters)
                .map_err(|e| map_engine_error(req_id.0.clone(), &e))?
                .candidates
                .into_iter()
                .map(|c| c.location_id)
                .collect()
        }
    };

    let config = GapConfig::from_app_config(&state.config);
    let report = analyze_gaps(
        snapshot.as_ref(),
        location_id,
        &competitor_ids,
        request.detail,
        &config,
    )
    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
