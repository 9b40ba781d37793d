//! Free-text location resolution.
//!
//! Maps a possibly ambiguous name reference to exactly one canonical
//! record through a fixed tier order: exact normalized match, containment
//! match, then token-prefiltered fuzzy match. Ties near the best score
//! are surfaced to the caller as [`Resolution::Ambiguous`] rather than
//! silently picked.

use serde::Serialize;
use uuid::Uuid;

use centrescan_core::{AppConfig, Location};

use crate::error::EngineError;
use crate::normalize::{normalize, shares_token, similarity};
use crate::repository::Repository;

#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Minimum similarity for the fuzzy tier.
    pub fuzzy_threshold: f64,
    /// Score spread within which leading candidates count as tied.
    pub ambiguity_epsilon: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.6,
            ambiguity_epsilon: 0.05,
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            fuzzy_threshold: config.resolver_fuzzy_threshold,
            ambiguity_epsilon: config.resolver_ambiguity_epsilon,
        }
    }
}

/// One scored resolution candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub location_id: Uuid,
    pub name: String,
    pub score: f64,
}

/// A successful resolution to a single canonical record.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMatch {
    pub location_id: Uuid,
    pub canonical_name: String,
    pub confidence: f64,
    /// Weaker candidates that also survived the winning tier.
    pub alternatives: Vec<ScoredCandidate>,
}

/// Outcome of a resolution attempt. Ambiguity and not-found are expected
/// results, not errors; callers decide how to proceed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Match(ResolvedMatch),
    Ambiguous { candidates: Vec<ScoredCandidate> },
    NotFound,
}

/// Resolve a free-text name against the corpus.
///
/// Deterministic for a fixed snapshot: candidates are ranked by score,
/// then shorter name, then higher store count, then name — never by
/// incidental iteration order.
///
/// # Errors
///
/// [`EngineError::InvalidInput`] for a blank query;
/// [`EngineError::Repository`] if the store cannot be reached.
pub fn resolve(
    repo: &impl Repository,
    raw_name: &str,
    config: &ResolverConfig,
) -> Result<Resolution, EngineError> {
    let query = normalize(raw_name);
    if query.is_empty() {
        return Err(EngineError::InvalidInput(
            "location name must contain at least one alphanumeric character".to_string(),
        ));
    }

    let locations = repo.all_locations()?;

    // Tier 1: exact normalized match.
    let exact: Vec<&Location> = locations
        .iter()
        .filter(|l| normalize(&l.name) == query)
        .collect();
    if exact.len() == 1 {
        return Ok(Resolution::Match(ResolvedMatch {
            location_id: exact[0].id,
            canonical_name: exact[0].name.clone(),
            confidence: 1.0,
            alternatives: Vec::new(),
        }));
    }
    if exact.len() > 1 {
        // Two records with the same normalized name are indistinguishable
        // by name alone; hand the list back for disambiguation.
        let candidates = exact
            .iter()
            .map(|l| ScoredCandidate {
                location_id: l.id,
                name: l.name.clone(),
                score: 1.0,
            })
            .collect();
        return Ok(Resolution::Ambiguous { candidates });
    }

    // Tier 2: containment in either direction.
    let mut survivors: Vec<(f64, &Location)> = locations
        .iter()
        .filter(|l| {
            let n = normalize(&l.name);
            n.contains(&query) || query.contains(&n)
        })
        .map(|l| (similarity(&query, &l.name), l))
        .collect();

    // Tier 3: token-prefiltered fuzzy scoring, only when containment
    // produced nothing.
    if survivors.is_empty() {
        survivors = locations
            .iter()
            .filter(|l| shares_token(&normalize(&l.name), &query))
            .map(|l| (similarity(&query, &l.name), l))
            .filter(|(score, _)| *score >= config.fuzzy_threshold)
            .collect();
    }

    if survivors.is_empty() {
        return Ok(Resolution::NotFound);
    }

    survivors.sort_by(|(sa, la), (sb, lb)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| la.name.len().cmp(&lb.name.len()))
            .then_with(|| {
                lb.number_of_stores
                    .unwrap_or(0)
                    .cmp(&la.number_of_stores.unwrap_or(0))
            })
            .then_with(|| la.name.cmp(&lb.name))
    });

    let best_score = survivors[0].0;
    let tied: Vec<&(f64, &Location)> = survivors
        .iter()
        .filter(|(s, _)| best_score - s <= config.ambiguity_epsilon)
        .collect();

    if tied.len() > 1 {
        let candidates = tied
            .iter()
            .map(|(s, l)| ScoredCandidate {
                location_id: l.id,
                name: l.name.clone(),
                score: *s,
            })
            .collect();
        return Ok(Resolution::Ambiguous { candidates });
    }

    let (score, winner) = survivors[0];
    let alternatives = survivors
        .iter()
        .skip(1)
        .take(5)
        .map(|(s, l)| ScoredCandidate {
            location_id: l.id,
            name: l.name.clone(),
            score: *s,
        })
        .collect();

    Ok(Resolution::Match(ResolvedMatch {
        location_id: winner.id,
        canonical_name: winner.name.clone(),
        confidence: score,
        alternatives,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Snapshot;
    use centrescan_core::LocationType;

    fn location(name: &str, stores: Option<u32>) -> Location {
        Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location_type: LocationType::ShoppingCentre,
            coordinates: None,
            postcode: None,
            city: None,
            county: None,
            website: None,
            number_of_stores: stores,
        }
    }

    fn snapshot(names: &[&str]) -> Snapshot {
        Snapshot::new(names.iter().map(|n| location(n, None)).collect(), Vec::new())
    }

    #[test]
    fn blank_query_is_invalid_input() {
        let snap = snapshot(&["Bluewater"]);
        let err = resolve(&snap, "   !!! ", &ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn exact_normalized_match_has_full_confidence() {
        let snap = snapshot(&["The Trafford Centre", "Bluewater"]);
        let resolution = resolve(&snap, "trafford centre!", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Match(m) => {
                assert_eq!(m.canonical_name, "The Trafford Centre");
                assert!((m.confidence - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn containment_resolves_partial_names() {
        let snap = snapshot(&["Gunwharf Quays", "Bluewater"]);
        let resolution = resolve(&snap, "gunwharf", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Match(m) => assert_eq!(m.canonical_name, "Gunwharf Quays"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn fuzzy_tier_catches_misspellings() {
        let snap = snapshot(&["Clyde Shopping Centre", "Bluewater"]);
        let resolution =
            resolve(&snap, "clyde shoping centre", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Match(m) => {
                assert_eq!(m.canonical_name, "Clyde Shopping Centre");
                assert!(m.confidence >= 0.6);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_is_not_found() {
        let snap = snapshot(&["Bluewater", "Lakeside"]);
        let resolution = resolve(&snap, "xanadu galleria", &ResolverConfig::default()).unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[test]
    fn near_tied_candidates_are_ambiguous() {
        let snap = snapshot(&["Eastgate Shopping Centre", "Westgate Shopping Centre"]);
        let resolution =
            resolve(&snap, "gate shopping centre", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_normalized_names_are_ambiguous() {
        let snap = snapshot(&["Clyde Shopping Centre", "The Clyde Shopping Centre"]);
        let resolution =
            resolve(&snap, "clyde shopping centre", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().all(|c| (c.score - 1.0).abs() < f64::EPSILON));
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn clear_winner_beats_epsilon_and_reports_alternatives() {
        let snap = snapshot(&["Trafford Retail Park", "The Trafford Centre"]);
        let resolution = resolve(&snap, "trafford", &ResolverConfig::default()).unwrap();
        match resolution {
            Resolution::Match(m) => {
                // Both contain the query; the shorter normalized form is
                // closer by edit distance and wins outside the epsilon.
                assert_eq!(m.canonical_name, "The Trafford Centre");
                assert_eq!(m.alternatives.len(), 1);
                assert_eq!(m.alternatives[0].name, "Trafford Retail Park");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn resolution_is_deterministic_across_calls() {
        let snap = snapshot(&[
            "Eldon Square",
            "Eldon Garden",
            "Metrocentre",
            "The Galleries",
        ]);
        let first = format!(
            "{:?}",
            resolve(&snap, "eldon", &ResolverConfig::default()).unwrap()
        );
        for _ in 0..10 {
            let next = format!(
                "{:?}",
                resolve(&snap, "eldon", &ResolverConfig::default()).unwrap()
            );
            assert_eq!(first, next);
        }
    }
}
