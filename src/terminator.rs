use glam::DVec3;

use crate::geo::GeoPoint;
use crate::solar::SubsolarPoint;

/// Clip plane through the globe's centre separating day from night.
///
/// The normal points away from the sun, so the sunlit hemisphere has negative
/// signed distance and is the part clipped out of a night overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminatorPlane {
    pub normal: DVec3,
    pub constant: f64,
}

impl TerminatorPlane {
    pub fn from_subsolar(sun: SubsolarPoint) -> Self {
        // The subsolar latitude is bounded by the axial tilt and the longitude
        // is wrapped, so both are always in range.
        let sun_dir = GeoPoint::new(sun.latitude, sun.longitude)
            .map(|p| p.to_cartesian(1.0))
            .unwrap_or(DVec3::X);
        Self {
            normal: -sun_dir,
            constant: 0.0,
        }
    }

    /// Unit vector towards the sun.
    pub fn sun_direction(&self) -> DVec3 {
        -self.normal
    }

    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.constant
    }

    /// Cosine of the solar zenith angle at `p`: 1 under the sun, 0 on the
    /// terminator, negative on the night side.
    pub fn illumination(&self, p: DVec3) -> f64 {
        let len = p.length();
        if len == 0.0 {
            return 0.0;
        }
        -self.signed_distance(p) / len
    }

    pub fn is_night(&self, p: DVec3) -> bool {
        self.signed_distance(p) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_at(latitude: f64, longitude: f64) -> TerminatorPlane {
        TerminatorPlane::from_subsolar(SubsolarPoint {
            latitude,
            longitude,
        })
    }

    fn surface(lat: f64, lon: f64) -> DVec3 {
        GeoPoint::new(lat, lon).unwrap().to_cartesian(1.0)
    }

    #[test]
    fn normal_is_negated_subsolar_direction() {
        let plane = plane_at(0.0, 0.0);
        assert!((plane.normal - DVec3::NEG_X).length() < 1e-12);
        assert_eq!(plane.constant, 0.0);
        assert!((plane.normal.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn subsolar_point_is_fully_lit_and_antipode_is_dark() {
        let plane = plane_at(20.0, -45.0);
        assert!((plane.illumination(surface(20.0, -45.0)) - 1.0).abs() < 1e-12);
        assert!((plane.illumination(surface(-20.0, 135.0)) + 1.0).abs() < 1e-12);
        assert!(plane.is_night(surface(-20.0, 135.0)));
        assert!(!plane.is_night(surface(20.0, -45.0)));
    }

    #[test]
    fn terminator_lies_ninety_degrees_from_the_sun() {
        let plane = plane_at(0.0, 30.0);
        for lat in [-60.0, 0.0, 45.0] {
            assert!(plane.illumination(surface(lat, 120.0)).abs() < 1e-12);
            assert!(plane.illumination(surface(lat, -60.0)).abs() < 1e-12);
        }
        assert!(plane.illumination(surface(0.0, 100.0)) > 0.0);
        assert!(plane.illumination(surface(0.0, 130.0)) < 0.0);
    }

    #[test]
    fn illumination_ignores_radius() {
        let plane = plane_at(10.0, 10.0);
        let p = surface(30.0, 40.0);
        assert!((plane.illumination(p) - plane.illumination(p * 7.5)).abs() < 1e-12);
        assert_eq!(plane.illumination(DVec3::ZERO), 0.0);
    }
}
