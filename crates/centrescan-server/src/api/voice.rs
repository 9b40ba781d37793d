//! Voice-platform adapter.
//!
//! The voice transport cannot handle non-200 responses, so every outcome
//! is encoded in the body: `success` is false only when the location
//! store itself is unavailable, and everything else becomes a
//! spoken-friendly `speech` string. The core error taxonomy never leaks
//! through this surface.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use centrescan_engine::{
    analyze_gaps, find_nearby, km_to_miles, miles_to_km, resolve, DetailLevel, EngineError,
    GapConfig, NearbyFilters, Resolution, ResolverConfig,
};

use crate::api::AppState;
use crate::middleware::RequestId;

const DEFAULT_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct VoiceQuery {
    pub location_name: String,
    pub radius_km: Option<f64>,
    pub radius_miles: Option<f64>,
    pub min_stores: Option<u32>,
    #[serde(default)]
    pub detail_level: DetailLevel,
}

#[derive(Debug, Serialize)]
pub struct VoiceReply {
    pub success: bool,
    pub speech: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl VoiceReply {
    fn spoken(speech: impl Into<String>) -> Self {
        Self {
            success: true,
            speech: speech.into(),
            data: None,
            error_code: None,
        }
    }

    fn with_data(speech: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::spoken(speech)
        }
    }

    fn unavailable() -> Self {
        Self {
            success: false,
            speech: "Sorry, the location directory is unavailable right now. Please try again \
                     in a few minutes."
                .to_string(),
            data: None,
            error_code: Some("repository_unavailable".to_string()),
        }
    }
}

/// `POST /voice/v1/query` — always HTTP 200.
pub async fn voice_query(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(query): Json<VoiceQuery>,
) -> Json<VoiceReply> {
    let snapshot = state.snapshot().await;

    let resolver_config = ResolverConfig::from_app_config(&state.config);
    let resolution = match resolve(snapshot.as_ref(), &query.location_name, &resolver_config) {
        Ok(resolution) => resolution,
        Err(EngineError::InvalidInput(_)) => {
            return Json(VoiceReply::spoken(
                "I need the name of a shopping centre or retail park to look up. Which location \
                 did you mean?",
            ));
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "voice resolve failed");
            return Json(VoiceReply::unavailable());
        }
    };

    let matched = match resolution {
        Resolution::Match(m) => m,
        Resolution::Ambiguous { candidates } => {
            let names: Vec<&str> = candidates.iter().take(3).map(|c| c.name.as_str()).collect();
            return Json(VoiceReply::spoken(format!(
                "I found more than one location matching that name, including {}. Which one did \
                 you mean?",
                names.join(" and ")
            )));
        }
        Resolution::NotFound => {
            return Json(VoiceReply::spoken(format!(
                "I couldn't find a location called {} in the directory.",
                query.location_name.trim()
            )));
        }
    };

    let radius_km = query
        .radius_km
        .or_else(|| query.radius_miles.map(miles_to_km))
        .unwrap_or(DEFAULT_RADIUS_KM);

    let filters = NearbyFilters {
        min_stores: query.min_stores,
        location_type: None,
        limit: Some(state.config.nearby_result_limit),
    };

    let nearby = match find_nearby(snapshot.as_ref(), matched.location_id, radius_km, &filters) {
        Ok(report) => report,
        Err(EngineError::InvalidInput(_)) => {
            return Json(VoiceReply::spoken(
                "That search radius doesn't look right. Try asking with a distance like ten \
                 kilometres or five miles.",
            ));
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "voice nearby failed");
            return Json(VoiceReply::unavailable());
        }
    };

    if nearby.missing_coordinates {
        return Json(VoiceReply::with_data(
            format!(
                "I found {}, but it hasn't been geocoded yet, so I can't tell you what's nearby.",
                matched.canonical_name
            ),
            json!({ "location": matched }),
        ));
    }

    let competitor_ids: Vec<_> = nearby.candidates.iter().map(|c| c.location_id).collect();
    let gap_config = GapConfig::from_app_config(&state.config);
    let gaps = match analyze_gaps(
        snapshot.as_ref(),
        matched.location_id,
        &competitor_ids,
        query.detail_level,
        &gap_config,
    ) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "voice gap analysis failed");
            return Json(VoiceReply::unavailable());
        }
    };

    let speech = compose_speech(&matched.canonical_name, radius_km, &nearby.candidates, &gaps);
    Json(VoiceReply::with_data(
        speech,
        json!({
            "location": matched,
            "nearby": nearby,
            "gaps": gaps,
        }),
    ))
}

fn compose_speech(
    name: &str,
    radius_km: f64,
    candidates: &[centrescan_engine::CompetitorCandidate],
    gaps: &centrescan_engine::GapReport,
) -> String {
    let radius_miles = km_to_miles(radius_km);
    let mut speech = match candidates.len() {
        0 => format!(
            "{name} has no competing locations within {radius_miles:.0} miles."
        ),
        1 => format!(
            "{name} has one competing location within {radius_miles:.0} miles: {}.",
            candidates[0].name
        ),
        n => {
            let nearest: Vec<&str> = candidates.iter().take(3).map(|c| c.name.as_str()).collect();
            format!(
                "{name} has {n} competing locations within {radius_miles:.0} miles. The closest \
                 are {}.",
                nearest.join(", ")
            )
        }
    };

    match gaps.priorities.first() {
        Some(top) => {
            speech.push(' ');
            speech.push_str(&format!(
                "The biggest category gap is {}.",
                top.category.display_name()
            ));
        }
        None if !candidates.is_empty() => {
            speech.push_str(" Its tenant mix already covers the neighbourhood's categories.");
        }
        None => {}
    }

    speech
}

#[cfg(test)]
mod tests {
    use super::*;
    use centrescan_core::Category;
    use centrescan_engine::GapRecommendation;
    use uuid::Uuid;

    fn candidate(name: &str, distance_km: f64) -> centrescan_engine::CompetitorCandidate {
        centrescan_engine::CompetitorCandidate {
            location_id: Uuid::new_v4(),
            name: name.to_string(),
            distance_km,
            location_type: centrescan_core::LocationType::ShoppingCentre,
            number_of_stores: None,
        }
    }

    fn empty_gaps() -> centrescan_engine::GapReport {
        centrescan_engine::GapReport {
            target_id: Uuid::new_v4(),
            priorities: Vec::new(),
            missing_categories: Vec::new(),
            under_represented: Vec::new(),
            target_distribution: Vec::new(),
            neighborhood_distribution: Vec::new(),
            low_confidence: false,
        }
    }

    #[test]
    fn speech_mentions_no_competitors() {
        let speech = compose_speech("Queensgate", miles_to_km(10.0), &[], &empty_gaps());
        assert!(speech.contains("no competing locations within 10 miles"));
    }

    #[test]
    fn speech_names_the_top_gap_category() {
        let mut gaps = empty_gaps();
        gaps.priorities.push(GapRecommendation {
            category: Category::FoodAndBeverage,
            gap_score: 12.0,
            gap_points: 8.0,
            rationale: String::new(),
            example_locations: Vec::new(),
        });
        let speech = compose_speech(
            "Queensgate",
            10.0,
            &[candidate("Serpentine Green", 4.2)],
            &gaps,
        );
        assert!(speech.contains("Serpentine Green"));
        assert!(speech.contains("Food & Beverage"));
    }

    #[test]
    fn speech_notes_full_coverage_when_no_gaps() {
        let speech = compose_speech(
            "Queensgate",
            10.0,
            &[candidate("Serpentine Green", 4.2)],
            &empty_gaps(),
        );
        assert!(speech.contains("already covers"));
    }
}
