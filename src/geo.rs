//! Geographic coordinates and their placement on the globe.
//!
//! The projection puts the texture seam at longitude ±180° and the north pole
//! on +Y. Every other module that turns a latitude/longitude into a vector
//! goes through [`GeoPoint::to_cartesian`] so overlays line up with shading.

use glam::DVec3;
use std::f64::consts::PI;

/// Mean Earth radius used for surface distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Royal Observatory, Greenwich. Fallback when no location is known.
pub const GREENWICH: GeoPoint = GeoPoint {
    latitude: 51.4779,
    longitude: -0.0015,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Returns `None` for non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Place the point on a sphere of radius `r`.
    ///
    /// `phi` is the colatitude and `theta` the longitude shifted by 180°, so
    /// (0°, 0°) lands on +X and longitude 90°E on -Z.
    pub fn to_cartesian(&self, r: f64) -> DVec3 {
        let phi = (90.0 - self.latitude) * PI / 180.0;
        let theta = (self.longitude + 180.0) * PI / 180.0;
        DVec3::new(
            -r * phi.sin() * theta.cos(),
            r * phi.cos(),
            r * phi.sin() * theta.sin(),
        )
    }

    /// Inverse of [`to_cartesian`](Self::to_cartesian) for any non-zero vector.
    /// Longitude is reported in [-180, 180); at the poles it is arbitrary.
    pub fn from_cartesian(v: DVec3) -> Option<Self> {
        let len = v.length();
        if !len.is_finite() || len == 0.0 {
            return None;
        }
        let latitude = (v.y / len).clamp(-1.0, 1.0).asin().to_degrees();
        let theta = v.z.atan2(-v.x).to_degrees();
        Some(Self {
            latitude,
            longitude: wrap_longitude(theta - 180.0),
        })
    }

    /// Central angle to `other`, in radians.
    pub fn central_angle(&self, other: &GeoPoint) -> f64 {
        angle_between(self.to_cartesian(1.0), other.to_cartesian(1.0))
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        self.central_angle(other) * EARTH_RADIUS_KM
    }
}

/// Angle between two vectors via `atan2(|a×b|, a·b)`, stable near 0 and π.
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    a.cross(b).length().atan2(a.dot(b))
}

pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
