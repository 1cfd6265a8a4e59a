const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points via the haversine
/// formula. Callers are responsible for passing finite coordinates.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coincident_points() {
        assert!(distance_km(20.734503, -103.455896, 20.734503, -103.455896).abs() < 1e-9);
        assert!(distance_km(0.0, 0.0, 0.0, 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        let d1 = distance_km(20.7, -103.4, 21.7, -104.4);
        let d2 = distance_km(21.7, -104.4, 20.7, -103.4);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let d = distance_km(20.0, -103.0, 21.0, -103.0);
        assert!((d - 111.19).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_antipodal_points() {
        // Half the circumference, no NaN from the atan2 form
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
        assert!(d.is_finite());
    }
}
