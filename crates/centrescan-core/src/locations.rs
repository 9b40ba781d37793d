//! Domain model for retail properties and their tenants.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::Category;

/// A geocoded point. Present only when both ordinates are known and finite;
/// an ungeocoded location carries `None` rather than a `(0, 0)` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    ShoppingCentre,
    RetailPark,
    Outlet,
    HighStreet,
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationType::ShoppingCentre => write!(f, "shopping-centre"),
            LocationType::RetailPark => write!(f, "retail-park"),
            LocationType::Outlet => write!(f, "outlet"),
            LocationType::HighStreet => write!(f, "high-street"),
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shopping-centre" | "shopping_centre" | "shopping centre" => {
                Ok(LocationType::ShoppingCentre)
            }
            "retail-park" | "retail_park" | "retail park" => Ok(LocationType::RetailPark),
            "outlet" => Ok(LocationType::Outlet),
            "high-street" | "high_street" | "high street" => Ok(LocationType::HighStreet),
            other => Err(crate::ConfigError::Validation(format!(
                "unknown location type: '{other}'"
            ))),
        }
    }
}

/// A canonical retail-property record.
///
/// Created and updated by external enrichment processes; the engine only
/// ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub location_type: LocationType,
    pub coordinates: Option<Coordinates>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub website: Option<String>,
    pub number_of_stores: Option<u32>,
}

impl Location {
    #[must_use]
    pub fn is_geocoded(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// A store operating inside exactly one [`Location`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub category: Category,
    pub is_anchor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_reject_non_finite() {
        assert!(Coordinates::new(f64::NAN, 0.5).is_none());
        assert!(Coordinates::new(51.5, f64::INFINITY).is_none());
    }

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -181.0).is_none());
    }

    #[test]
    fn coordinates_accept_valid_uk_point() {
        let c = Coordinates::new(53.4668, -2.3089).unwrap();
        assert!((c.latitude - 53.4668).abs() < f64::EPSILON);
    }

    #[test]
    fn location_type_round_trips_through_display() {
        for lt in [
            LocationType::ShoppingCentre,
            LocationType::RetailPark,
            LocationType::Outlet,
            LocationType::HighStreet,
        ] {
            let parsed: LocationType = lt.to_string().parse().unwrap();
            assert_eq!(parsed, lt);
        }
    }
}
