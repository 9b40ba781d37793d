//! Great-circle distance between geocoded points.
//!
//! The engine works in kilometres throughout; callers that speak miles
//! convert at the boundary with [`miles_to_km`] so a single Earth-radius
//! constant covers every computation in a call.

use centrescan_core::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_PER_MILE: f64 = 1.609_344;

/// Haversine distance between two points, in kilometres.
///
/// Symmetric within floating tolerance: `haversine_km(a, b)` and
/// `haversine_km(b, a)` agree to 1e-9 relative.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[must_use]
pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

#[must_use]
pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = coords(53.4668, -2.3089);
        assert!(haversine_km(p, p).abs() < 1e-12);
    }

    #[test]
    fn peterborough_to_cambridge_is_about_48_km() {
        // Queensgate, Peterborough → central Cambridge; ~48 km / ~30 mi.
        let d = haversine_km(coords(52.5736, -0.2478), coords(52.2053, 0.1218));
        assert!((46.0..50.0).contains(&d), "expected ~48 km, got {d:.1}");
        let miles = km_to_miles(d);
        assert!(
            (29.0..31.0).contains(&miles),
            "expected ~30 miles, got {miles:.1}"
        );
    }

    #[test]
    fn symmetry_holds_within_relative_tolerance() {
        let pairs = [
            (coords(51.5074, -0.1278), coords(55.8642, -4.2518)),
            (coords(52.5736, -0.2478), coords(52.2053, 0.1218)),
            (coords(50.0, -5.0), coords(58.0, -3.0)),
        ];
        for (a, b) in pairs {
            let ab = haversine_km(a, b);
            let ba = haversine_km(b, a);
            assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0), "{ab} vs {ba}");
        }
    }

    #[test]
    fn mile_conversion_round_trips() {
        let km = miles_to_km(50.0);
        assert!((km_to_miles(km) - 50.0).abs() < 1e-9);
        assert!((km - 80.467_2).abs() < 1e-3);
    }
}
