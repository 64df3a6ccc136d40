use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let candidate = Self { lat, lng };
        candidate.is_valid().then_some(candidate)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in meters.
    pub fn haversine_meters(&self, other: &LatLng) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(LatLng::new(91.0, 0.0).is_none());
        assert!(LatLng::new(0.0, -180.5).is_none());
        assert!(LatLng::new(f64::NAN, 0.0).is_none());
        assert!(LatLng::new(21.03, 105.85).is_some());
    }

    #[test]
    fn haversine_is_symmetric_and_plausible() {
        // Hoan Kiem Lake to the Temple of Literature, roughly 2 km
        let a = LatLng::new(21.0288, 105.8525).unwrap();
        let b = LatLng::new(21.0277, 105.8355).unwrap();
        let d = a.haversine_meters(&b);
        assert!((1_600.0..2_000.0).contains(&d), "got {}", d);
        assert!((d - b.haversine_meters(&a)).abs() < 1e-6);
        assert_eq!(a.haversine_meters(&a), 0.0);
    }
}
