//! Radius queries over the geocoded corpus.

use serde::Serialize;
use uuid::Uuid;

use centrescan_core::{AppConfig, LocationType};

use crate::error::EngineError;
use crate::geo::haversine_km;
use crate::repository::Repository;

pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Optional attribute filters applied after the radius cut.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearbyFilters {
    pub min_stores: Option<u32>,
    pub location_type: Option<LocationType>,
    /// Result cap; defaults to [`DEFAULT_RESULT_LIMIT`].
    pub limit: Option<usize>,
}

impl NearbyFilters {
    #[must_use]
    pub fn with_limit_from(config: &AppConfig) -> Self {
        Self {
            limit: Some(config.nearby_result_limit),
            ..Self::default()
        }
    }
}

/// A geocoded neighbor within the requested radius.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorCandidate {
    pub location_id: Uuid,
    pub name: String,
    pub distance_km: f64,
    pub location_type: LocationType,
    pub number_of_stores: Option<u32>,
}

/// Result of a proximity query.
///
/// An ungeocoded origin yields an empty candidate list with
/// `missing_coordinates` set — proximity is undefined there, which is a
/// data-completeness state rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyReport {
    pub origin_id: Uuid,
    pub radius_km: f64,
    pub candidates: Vec<CompetitorCandidate>,
    pub missing_coordinates: bool,
}

/// Find geocoded neighbors of `origin_id` within `radius_km`.
///
/// The origin itself is always excluded; candidates without coordinates
/// are skipped; results are sorted ascending by distance with the id as a
/// deterministic tie-break, then capped.
///
/// # Errors
///
/// [`EngineError::InvalidInput`] for a non-positive or non-finite radius;
/// [`EngineError::UnknownLocation`] if the origin id is not in the corpus;
/// [`EngineError::Repository`] if the store cannot be reached.
pub fn find_nearby(
    repo: &impl Repository,
    origin_id: Uuid,
    radius_km: f64,
    filters: &NearbyFilters,
) -> Result<NearbyReport, EngineError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "radius must be a positive number of kilometres, got {radius_km}"
        )));
    }

    let origin = repo
        .location_by_id(origin_id)?
        .ok_or(EngineError::UnknownLocation(origin_id))?;

    let Some(origin_coords) = origin.coordinates else {
        tracing::warn!(
            location_id = %origin_id,
            name = %origin.name,
            "proximity query on ungeocoded location"
        );
        return Ok(NearbyReport {
            origin_id,
            radius_km,
            candidates: Vec::new(),
            missing_coordinates: true,
        });
    };

    let limit = filters.limit.unwrap_or(DEFAULT_RESULT_LIMIT);

    let mut candidates: Vec<CompetitorCandidate> = repo
        .all_locations()?
        .into_iter()
        .filter(|l| l.id != origin_id)
        .filter_map(|l| {
            let coords = l.coordinates?;
            let distance_km = haversine_km(origin_coords, coords);
            if distance_km > radius_km {
                return None;
            }
            Some(CompetitorCandidate {
                location_id: l.id,
                name: l.name,
                distance_km,
                location_type: l.location_type,
                number_of_stores: l.number_of_stores,
            })
        })
        .filter(|c| match filters.min_stores {
            Some(min) => c.number_of_stores.unwrap_or(0) >= min,
            None => true,
        })
        .filter(|c| match filters.location_type {
            Some(lt) => c.location_type == lt,
            None => true,
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location_id.cmp(&b.location_id))
    });
    candidates.truncate(limit);

    Ok(NearbyReport {
        origin_id,
        radius_km,
        candidates,
        missing_coordinates: false,
    })
}
