use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use centrescan_core::LocationType;
use centrescan_engine::{find_nearby, miles_to_km, NearbyFilters, NearbyReport};

use crate::api::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub radius_km: Option<f64>,
    pub radius_miles: Option<f64>,
    pub min_stores: Option<u32>,
    pub location_type: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/v1/locations/{location_id}/nearby`
///
/// `radius_km` wins when both radii are supplied; miles are converted at
/// this boundary and never reach the engine.
pub async fn list_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(location_id): Path<Uuid>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<NearbyReport>>, ApiError> {
    let radius_km = params
        .radius_km
        .or_else(|| params.radius_miles.map(miles_to_km))
        .unwrap_or(DEFAULT_RADIUS_KM);

    let location_type = match params.location_type.as_deref() {
        Some(raw) => Some(raw.parse::<LocationType>().map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown location type {raw:?}"),
            )
        })?),
        None => None,
    };

    let filters = NearbyFilters {
        min_stores: params.min_stores,
        location_type,
        limit: Some(
            params
                .limit
                .unwrap_or(state.config.nearby_result_limit)
                .min(state.config.nearby_result_limit),
        ),
    };

    let snapshot = state.snapshot().await;
    let report = find_nearby(snapshot.as_ref(), location_id, radius_km, &filters)
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
