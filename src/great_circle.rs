//! Great-circle routes between airports.
//!
//! [`GreatCircle`] is the lazy interpolator; [`FlightPath`] is what the globe
//! actually draws: the two airports plus a collected copy of the samples.

use glam::DVec3;
use std::f64::consts::PI;
use std::iter::FusedIterator;

use crate::airports::Airport;
use crate::geo::{angle_between, GeoPoint};

/// Default number of segments between departure and arrival.
pub const DEFAULT_SAMPLES: usize = 100;

const DEGENERATE_EPS: f64 = 1e-12;

/// Minor arc between two points on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreatCircle {
    start: DVec3,
    end: DVec3,
    angle: f64,
}

impl GreatCircle {
    pub fn new(from: GeoPoint, to: GeoPoint) -> Self {
        let start = from.to_cartesian(1.0);
        let end = to.to_cartesian(1.0);
        Self {
            start,
            end,
            angle: angle_between(start, end),
        }
    }

    /// Central angle of the arc in radians, in [0, π].
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Unit vector at fraction `f` of the way along the arc.
    pub fn point_at(&self, f: f64) -> DVec3 {
        if self.angle < DEGENERATE_EPS {
            return self.start;
        }

        let sin_angle = self.angle.sin();
        if sin_angle < DEGENERATE_EPS {
            // Antipodal: every half circle is a shortest path. Pick one
            // through an arbitrary axis orthogonal to the start.
            let axis = self.start.any_orthonormal_vector();
            let t = f * PI;
            return (self.start * t.cos() + axis * t.sin()).normalize();
        }

        let a = ((1.0 - f) * self.angle).sin() / sin_angle;
        let b = (f * self.angle).sin() / sin_angle;
        (self.start * a + self.end * b).normalize()
    }

    /// `segments + 1` evenly spaced points scaled to `radius`. Calling this
    /// again restarts the sequence.
    pub fn samples(&self, segments: usize, radius: f64) -> Samples {
        Samples {
            arc: *self,
            segments,
            radius,
            next: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Samples {
    arc: GreatCircle,
    segments: usize,
    radius: f64,
    next: usize,
}

impl Iterator for Samples {
    type Item = DVec3;

    fn next(&mut self) -> Option<DVec3> {
        if self.next > self.segments {
            return None;
        }
        let f = if self.segments == 0 {
            0.0
        } else {
            self.next as f64 / self.segments as f64
        };
        self.next += 1;
        Some(self.arc.point_at(f) * self.radius)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.segments + 1).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples {}

impl FusedIterator for Samples {}

#[derive(Debug, Clone)]
pub struct FlightPath {
    pub departure: Airport,
    pub arrival: Airport,
    pub points: Vec<DVec3>,
}

impl FlightPath {
    pub fn new(departure: Airport, arrival: Airport, segments: usize, radius: f64) -> Self {
        let points = GreatCircle::new(departure.position, arrival.position)
            .samples(segments, radius)
            .collect();
        Self {
            departure,
            arrival,
            points,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.departure.position.distance_km(&self.arrival.position)
    }
}
