//! Subsolar point from a UTC instant.
//!
//! Longitude comes from the time of solar noon at Greenwich (low-precision
//! solar transit, equation of time included). Latitude uses the cosine
//! declination approximation, good to within about a degree.

use chrono::{DateTime, Datelike, Utc};
use std::f64::consts::PI;

const MS_PER_DAY: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;

pub const AXIAL_TILT_DEG: f64 = 23.44;
const DEGREES_PER_HOUR: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsolarPoint {
    pub latitude: f64,
    pub longitude: f64,
}

fn julian(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / MS_PER_DAY - 0.5 + J1970
}

/// Julian date of the solar transit at longitude 0 nearest to `t`.
fn solar_transit_julian(t: DateTime<Utc>) -> f64 {
    let d = julian(t) - J2000;
    let cycle = (d - J0).round();
    let ds = J0 + cycle;

    let m = (357.5291 + 0.985_600_28 * ds).to_radians();
    let c = (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin()).to_radians();
    let l = m + c + 102.9372_f64.to_radians() + PI;

    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// Time of solar noon at Greenwich nearest to `t`.
pub fn solar_noon(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let ms = (solar_transit_julian(t) + 0.5 - J1970) * MS_PER_DAY;
    DateTime::from_timestamp_millis(ms.round() as i64)
}

/// Solar declination approximation for a zero-based day of the year.
pub fn declination(day_of_year: u32) -> f64 {
    -AXIAL_TILT_DEG * (2.0 * PI / 365.0 * (day_of_year as f64 + 10.0)).cos()
}

pub fn subsolar_point(t: DateTime<Utc>) -> SubsolarPoint {
    let hours_to_noon = (solar_transit_julian(t) - julian(t)) * 24.0;
    let longitude = crate::geo::wrap_longitude(hours_to_noon * DEGREES_PER_HOUR);
    let latitude = declination(t.ordinal0());

    SubsolarPoint {
        latitude,
        longitude,
    }
}
