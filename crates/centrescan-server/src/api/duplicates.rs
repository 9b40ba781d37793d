use axum::{extract::State, Extension, Json};
use serde::Serialize;

use centrescan_engine::{CancelFlag, DedupeConfig, ScanError, ScanReport};

use crate::api::{map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub duplicate_pairs: usize,
    pub compared_pairs: usize,
    pub skipped_pairs: usize,
    pub unblockable_records: usize,
    pub cancelled: bool,
    pub report: ScanReport,
}

fn summarize(report: ScanReport) -> ScanSummary {
    ScanSummary {
        duplicate_pairs: report.pairs.len(),
        compared_pairs: report.compared_pairs,
        skipped_pairs: report.skipped_pairs,
        unblockable_records: report.unblockable_records,
        cancelled: report.cancelled,
        report,
    }
}

/// `POST /api/v1/duplicates/scan`
///
/// Runs the scan on the blocking pool over the current snapshot and
/// stores the report for `/duplicates/latest`. The scanner is
/// single-flight; a concurrent trigger gets a `conflict`.
pub async fn trigger_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ScanSummary>>, ApiError> {
    let snapshot = state.snapshot().await;
    let scanner = state.scanner.clone();
    let config = DedupeConfig::from_app_config(&state.config);

    let result = tokio::task::spawn_blocking(move || {
        scanner.scan(snapshot.as_ref(), &config, &CancelFlag::new())
    })
    .await;

    let report = match result {
        Ok(Ok(report)) => report,
        Ok(Err(ScanError::ScanInProgress)) => {
            return Err(ApiError::new(
                req_id.0,
                "conflict",
                "a duplicate scan is already in progress",
            ));
        }
        Ok(Err(ScanError::Engine(e))) => return Err(map_engine_error(req_id.0, &e)),
        Err(e) => {
            tracing::error!(error = %e, "duplicate scan task failed");
            return Err(ApiError::new(
                req_id.0,
                "internal_error",
                "duplicate scan task failed",
            ));
        }
    };

    *state.latest_scan.write().await = Some(report.clone());

    Ok(Json(ApiResponse {
        data: summarize(report),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/duplicates/latest`
pub async fn latest_scan_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ScanSummary>>, ApiError> {
    let latest = state.latest_scan.read().await.clone();
    match latest {
        Some(report) => Ok(Json(ApiResponse {
            data: summarize(report),
            meta: ResponseMeta::new(req_id.0),
        })),
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            "no duplicate scan has completed yet",
        )),
    }
}
