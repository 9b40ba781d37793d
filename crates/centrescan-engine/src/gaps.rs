//! Tenant-category gap analysis.
//!
//! Compares a target location's category mix against the aggregate mix of
//! its neighborhood and ranks the shortfalls. Neighborhood evidence is
//! weighted by raw tenant counts, so busier centres contribute more, and
//! the ranking down-weights categories backed by very few observed
//! tenants.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use centrescan_core::{AppConfig, Category, Tenant};

use crate::error::EngineError;
use crate::repository::Repository;

#[derive(Debug, Clone, Copy)]
pub struct GapConfig {
    /// Percentage-point shortfall beyond which a present category counts
    /// as under-represented.
    pub margin_points: f64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self { margin_points: 5.0 }
    }
}

impl GapConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            margin_points: config.gap_margin_points,
        }
    }
}

/// How much detail goes into each recommendation's rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Summary only.
    #[default]
    High,
    /// Attach example competitor locations carrying each category.
    Detailed,
}

/// One category's share of a tenant mix.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub tenant_count: usize,
    pub percent_of_total: f64,
}

/// A ranked shortfall recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct GapRecommendation {
    pub category: Category,
    /// `gap_points × ln(1 + neighborhood tenant count)`; always ≥ 0.
    pub gap_score: f64,
    /// Raw percentage-point shortfall, clamped at zero.
    pub gap_points: f64,
    pub rationale: String,
    /// Competitor locations carrying the category; populated at
    /// [`DetailLevel::Detailed`], capped at three.
    pub example_locations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub target_id: Uuid,
    pub priorities: Vec<GapRecommendation>,
    pub missing_categories: Vec<Category>,
    pub under_represented: Vec<Category>,
    pub target_distribution: Vec<CategoryBucket>,
    pub neighborhood_distribution: Vec<CategoryBucket>,
    /// Set when the target has no tenant data at all; the report is still
    /// valid but rests on the neighborhood alone.
    pub low_confidence: bool,
}

/// Compare the target's category mix against its neighborhood.
///
/// The target is removed from the competitor set if the caller included
/// it. An empty competitor list is valid and yields empty priorities.
///
/// # Errors
///
/// [`EngineError::UnknownLocation`] if the target id is not in the
/// corpus; [`EngineError::Repository`] if the store cannot be reached.
pub fn analyze_gaps(
    repo: &impl Repository,
    target_id: Uuid,
    competitor_ids: &[Uuid],
    detail: DetailLevel,
    config: &GapConfig,
) -> Result<GapReport, EngineError> {
    repo.location_by_id(target_id)?
        .ok_or(EngineError::UnknownLocation(target_id))?;

    let mut competitors: Vec<Uuid> = competitor_ids
        .iter()
        .copied()
        .filter(|id| *id != target_id)
        .collect();
    competitors.sort();
    competitors.dedup();

    let target_tenants = repo.tenants_by_location(target_id)?;
    let neighborhood_tenants = repo.tenants_by_locations(&competitors)?;

    let target_counts = count_by_category(&target_tenants);
    let neighborhood_counts = count_by_category(&neighborhood_tenants);

    let target_total: usize = target_counts.values().sum();
    let neighborhood_total: usize = neighborhood_counts.values().sum();

    let low_confidence = target_total == 0;

    let mut priorities = Vec::new();
    let mut missing_categories = Vec::new();
    let mut under_represented = Vec::new();

    // Example lookup is only needed at the detailed level.
    let examples = match detail {
        DetailLevel::Detailed => example_locations_by_category(repo, &competitors)?,
        DetailLevel::High => HashMap::new(),
    };

    for (&category, &count) in &neighborhood_counts {
        if category == Category::Other {
            // "Other" is the taxonomy's junk drawer; recommending it
            // would be meaningless.
            continue;
        }
        let neighborhood_pct = percent(count, neighborhood_total);
        let target_count = target_counts.get(&category).copied().unwrap_or(0);
        let target_pct = percent(target_count, target_total);

        let gap_points = (neighborhood_pct - target_pct).max(0.0);
        if target_count == 0 {
            missing_categories.push(category);
        } else if gap_points > config.margin_points {
            under_represented.push(category);
        } else {
            continue;
        }
        if gap_points <= 0.0 {
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let gap_score = gap_points * (1.0 + count as f64).ln();

        let rationale = if target_count == 0 {
            format!(
                "{} makes up {neighborhood_pct:.1}% of the neighbourhood tenant mix but is absent here",
                category.display_name()
            )
        } else {
            format!(
                "{} makes up {neighborhood_pct:.1}% of the neighbourhood tenant mix but only {target_pct:.1}% here",
                category.display_name()
            )
        };

        priorities.push(GapRecommendation {
            category,
            gap_score,
            gap_points,
            rationale,
            example_locations: examples.get(&category).cloned().unwrap_or_default(),
        });
    }

    priorities.sort_by(|a, b| {
        b.gap_score
            .partial_cmp(&a.gap_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(GapReport {
        target_id,
        priorities,
        missing_categories,
        under_represented,
        target_distribution: to_buckets(&target_counts, target_total),
        neighborhood_distribution: to_buckets(&neighborhood_counts, neighborhood_total),
        low_confidence,
    })
}

fn count_by_category(tenants: &[Tenant]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for tenant in tenants {
        *counts.entry(tenant.category).or_insert(0) += 1;
    }
    counts
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64 / total as f64 * 100.0
    }
}

fn to_buckets(counts: &BTreeMap<Category, usize>, total: usize) -> Vec<CategoryBucket> {
    counts
        .iter()
        .map(|(&category, &tenant_count)| CategoryBucket {
            category,
            tenant_count,
            percent_of_total: percent(tenant_count, total),
        })
        .collect()
}

/// Names of competitor locations that carry each category, capped at three
/// per category, in competitor-id order for determinism.
fn example_locations_by_category(
    repo: &impl Repository,
    competitor_ids: &[Uuid],
) -> Result<HashMap<Category, Vec<String>>, EngineError> {
    let mut examples: HashMap<Category, Vec<String>> = HashMap::new();
    for &id in competitor_ids {
        let Some(location) = repo.location_by_id(id)? else {
            continue;
        };
        for tenant in repo.tenants_by_location(id)? {
            let entry = examples.entry(tenant.category).or_default();
            if entry.len() < 3 && !entry.contains(&location.name) {
                entry.push(location.name.clone());
            }
        }
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Snapshot;
    use centrescan_core::{Location, LocationType};

    fn location(name: &str) -> Location {
        Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location_type: LocationType::ShoppingCentre,
            coordinates: None,
            postcode: None,
            city: None,
            county: None,
            website: None,
            number_of_stores: None,
        }
    }

    fn tenant(location_id: Uuid, category: Category) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            location_id,
            name: "store".to_string(),
            category,
            is_anchor: false,
        }
    }

    fn tenants(location_id: Uuid, spec: &[(Category, usize)]) -> Vec<Tenant> {
        spec.iter()
            .flat_map(|&(category, n)| (0..n).map(move |_| tenant(location_id, category)))
            .collect()
    }

    #[test]
    fn unknown_target_is_reported() {
        let snap = Snapshot::new(Vec::new(), Vec::new());
        let result = analyze_gaps(
            &snap,
            Uuid::new_v4(),
            &[],
            DetailLevel::High,
            &GapConfig::default(),
        );
        assert!(matches!(result, Err(EngineError::UnknownLocation(_))));
    }

    #[test]
    fn empty_competitor_list_yields_empty_priorities() {
        let target = location("Target");
        let target_id = target.id;
        let stock = tenants(target_id, &[(Category::Fashion, 5)]);
        let snap = Snapshot::new(vec![target], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();
        assert!(report.priorities.is_empty());
        assert!(report.missing_categories.is_empty());
        assert!(!report.low_confidence);
    }

    #[test]
    fn missing_category_is_recommended() {
        let target = location("Target");
        let competitor = location("Competitor");
        let (target_id, competitor_id) = (target.id, competitor.id);

        let mut stock = tenants(target_id, &[(Category::Fashion, 10)]);
        stock.extend(tenants(
            competitor_id,
            &[(Category::Fashion, 10), (Category::FoodAndBeverage, 10)],
        ));
        let snap = Snapshot::new(vec![target, competitor], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();

        assert_eq!(report.missing_categories, vec![Category::FoodAndBeverage]);
        assert_eq!(report.priorities.len(), 1);
        assert_eq!(report.priorities[0].category, Category::FoodAndBeverage);
        assert!(report.priorities[0].rationale.contains("absent"));
    }

    #[test]
    fn other_category_is_never_recommended() {
        let target = location("Target");
        let competitor = location("Competitor");
        let (target_id, competitor_id) = (target.id, competitor.id);

        // The neighborhood is dominated by unclassifiable tenants; the
        // target carries none of them.
        let mut stock = tenants(target_id, &[(Category::Fashion, 10)]);
        stock.extend(tenants(
            competitor_id,
            &[(Category::Other, 20), (Category::Grocery, 5)],
        ));
        let snap = Snapshot::new(vec![target, competitor], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();

        assert!(report.priorities.iter().all(|r| r.category != Category::Other));
        assert!(!report.missing_categories.contains(&Category::Other));
        assert!(!report.under_represented.contains(&Category::Other));
        // It still shows up in the raw distribution.
        assert!(report
            .neighborhood_distribution
            .iter()
            .any(|b| b.category == Category::Other));
    }

    #[test]
    fn all_gap_scores_are_non_negative() {
        let target = location("Target");
        let competitor = location("Competitor");
        let (target_id, competitor_id) = (target.id, competitor.id);

        let mut stock = tenants(
            target_id,
            &[(Category::Fashion, 20), (Category::Grocery, 1)],
        );
        stock.extend(tenants(
            competitor_id,
            &[
                (Category::Fashion, 2),
                (Category::Grocery, 8),
                (Category::Services, 5),
            ],
        ));
        let snap = Snapshot::new(vec![target, competitor], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();

        for rec in &report.priorities {
            assert!(rec.gap_score >= 0.0, "{:?}", rec);
            assert!(rec.gap_points >= 0.0);
        }
    }

    #[test]
    fn over_representation_is_not_a_gap() {
        let target = location("Target");
        let competitor = location("Competitor");
        let (target_id, competitor_id) = (target.id, competitor.id);

        // Target is fashion-heavy relative to the neighborhood.
        let mut stock = tenants(target_id, &[(Category::Fashion, 30)]);
        stock.extend(tenants(competitor_id, &[(Category::Fashion, 1)]));
        let snap = Snapshot::new(vec![target, competitor], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();
        assert!(report.priorities.is_empty());
    }

    #[test]
    fn zero_tenant_target_flags_low_confidence_and_reports_all_missing() {
        let target = location("Empty Target");
        let competitor = location("Competitor");
        let (target_id, competitor_id) = (target.id, competitor.id);

        let stock = tenants(
            competitor_id,
            &[(Category::Fashion, 5), (Category::Grocery, 5)],
        );
        let snap = Snapshot::new(vec![target, competitor], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();

        assert!(report.low_confidence);
        assert_eq!(report.missing_categories.len(), 2);
        assert_eq!(report.priorities.len(), 2);
    }

    #[test]
    fn bucket_percentages_sum_to_one_hundred() {
        let target = location("Target");
        let target_id = target.id;
        let stock = tenants(
            target_id,
            &[
                (Category::Fashion, 3),
                (Category::Grocery, 4),
                (Category::Services, 6),
            ],
        );
        let snap = Snapshot::new(vec![target], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();
        let total: f64 = report
            .target_distribution
            .iter()
            .map(|b| b.percent_of_total)
            .sum();
        assert!((total - 100.0).abs() < 1e-9, "sum was {total}");
    }

    #[test]
    fn weighting_downranks_thin_evidence() {
        let target = location("Target");
        let busy = location("Busy Competitor");
        let quiet = location("Quiet Competitor");
        let (target_id, busy_id, quiet_id) = (target.id, busy.id, quiet.id);

        // Grocery backed by 40 observed tenants, jewellery by a single one.
        let mut stock = tenants(target_id, &[(Category::Fashion, 10)]);
        stock.extend(tenants(busy_id, &[(Category::Grocery, 40)]));
        stock.extend(tenants(quiet_id, &[(Category::JewelleryAndAccessories, 1)]));
        let snap = Snapshot::new(vec![target, busy, quiet], stock);

        let report = analyze_gaps(
            &snap,
            target_id,
            &[busy_id, quiet_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();

        assert_eq!(report.priorities[0].category, Category::Grocery);
        let jewellery = report
            .priorities
            .iter()
            .find(|r| r.category == Category::JewelleryAndAccessories)
            .unwrap();
        assert!(report.priorities[0].gap_score > jewellery.gap_score);
    }

    #[test]
    fn detailed_level_attaches_example_locations() {
        let target = location("Target");
        let competitor = location("Silverburn");
        let (target_id, competitor_id) = (target.id, competitor.id);

        let stock = tenants(competitor_id, &[(Category::Grocery, 3)]);
        let snap = Snapshot::new(vec![target, competitor], stock);

        let detailed = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::Detailed,
            &GapConfig::default(),
        )
        .unwrap();
        assert_eq!(
            detailed.priorities[0].example_locations,
            vec!["Silverburn".to_string()]
        );

        let summary = analyze_gaps(
            &snap,
            target_id,
            &[competitor_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();
        assert!(summary.priorities[0].example_locations.is_empty());
    }

    #[test]
    fn target_is_dropped_from_competitor_list() {
        let target = location("Target");
        let target_id = target.id;
        let stock = tenants(target_id, &[(Category::Fashion, 5)]);
        let snap = Snapshot::new(vec![target], stock);

        // Passing the target as its own competitor must not make its own
        // stock look like neighborhood evidence.
        let report = analyze_gaps(
            &snap,
            target_id,
            &[target_id],
            DetailLevel::High,
            &GapConfig::default(),
        )
        .unwrap();
        assert!(report.neighborhood_distribution.is_empty());
        assert!(report.priorities.is_empty());
    }
}
