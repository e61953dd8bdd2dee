use crate::models::position::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Straight-line ETA in whole minutes; `None` when either endpoint is
/// unknown or the math does not come out finite. Clamped to a minimum of 1.
pub fn eta_minutes(from: Option<&GeoPoint>, to: Option<&GeoPoint>, speed_kmh: f64) -> Option<u32> {
    let from = from?;
    let to = to?;

    let distance_km = haversine_km(from, to);
    if !distance_km.is_finite() {
        return None;
    }

    let minutes = distance_km / speed_kmh * 60.0;
    if !minutes.is_finite() {
        return None;
    }

    Some((minutes.round() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::{eta_minutes, haversine_km};
    use crate::models::position::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 39.2904,
            lng: -76.6122,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let depot = GeoPoint {
            lat: 39.2904,
            lng: -76.6122,
        };
        let clinic = GeoPoint {
            lat: 39.3299,
            lng: -76.6205,
        };
        let there = haversine_km(&depot, &clinic);
        let back = haversine_km(&clinic, &depot);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn eta_is_null_without_both_endpoints() {
        let p = GeoPoint {
            lat: 39.29,
            lng: -76.60,
        };
        assert_eq!(eta_minutes(None, Some(&p), 40.0), None);
        assert_eq!(eta_minutes(Some(&p), None, 40.0), None);
        assert_eq!(eta_minutes(None, None, 40.0), None);
    }

    #[test]
    fn eta_never_rounds_down_to_zero() {
        let a = GeoPoint {
            lat: 39.2904,
            lng: -76.6122,
        };
        let b = GeoPoint {
            lat: 39.2905,
            lng: -76.6122,
        };
        assert_eq!(eta_minutes(Some(&a), Some(&b), 40.0), Some(1));
        assert_eq!(eta_minutes(Some(&a), Some(&a), 40.0), Some(1));
    }

    #[test]
    fn eta_matches_distance_over_speed() {
        let driver = GeoPoint {
            lat: 39.29,
            lng: -76.60,
        };
        let stop = GeoPoint {
            lat: 39.30,
            lng: -76.61,
        };
        // ~1.4 km apart; at 40 km/h that is about 2 minutes.
        let eta = eta_minutes(Some(&driver), Some(&stop), 40.0).unwrap();
        assert!((1..=3).contains(&eta));
    }

    #[test]
    fn eta_is_null_for_degenerate_speed() {
        let a = GeoPoint {
            lat: 39.29,
            lng: -76.60,
        };
        let b = GeoPoint {
            lat: 39.30,
            lng: -76.61,
        };
        assert_eq!(eta_minutes(Some(&a), Some(&b), 0.0), None);
    }
}
