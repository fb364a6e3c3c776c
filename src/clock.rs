use chrono::{DateTime, TimeDelta, Utc};
use std::time::{Duration, Instant};

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 86_400.0;

/// Maps wall-clock time since `started` onto simulated UTC.
///
/// `now = origin + elapsed * scale`. Changing the scale rebases the origin on
/// the current simulated instant so the terminator never jumps.
#[derive(Debug, Clone)]
pub struct SimClock {
    origin: DateTime<Utc>,
    started: Instant,
    scale: f64,
}

impl SimClock {
    pub fn new(origin: DateTime<Utc>, scale: f64) -> Self {
        Self {
            origin,
            started: Instant::now(),
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Simulated time after `elapsed` of wall time.
    pub fn at(&self, elapsed: Duration) -> DateTime<Utc> {
        let sim_ms = (elapsed.as_secs_f64() * self.scale * 1000.0).round();
        TimeDelta::try_milliseconds(sim_ms as i64)
            .and_then(|delta| self.origin.checked_add_signed(delta))
            .unwrap_or(self.origin)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.at(self.started.elapsed())
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.origin = self.now();
        self.started = Instant::now();
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Step through 1x, 60x, 600x, 3600x, 86400x.
    pub fn faster(&mut self) {
        let next = SCALE_STEPS
            .iter()
            .copied()
            .find(|s| *s > self.scale)
            .unwrap_or(MAX_SCALE);
        self.set_scale(next);
    }

    pub fn slower(&mut self) {
        let next = SCALE_STEPS
            .iter()
            .rev()
            .copied()
            .find(|s| *s < self.scale)
            .unwrap_or(MIN_SCALE);
        self.set_scale(next);
    }
}

const SCALE_STEPS: [f64; 5] = [1.0, 60.0, 600.0, 3600.0, 86_400.0];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn maps_elapsed_time_through_the_scale() {
        let clock = SimClock::new(origin(), 60.0);
        assert_eq!(clock.at(Duration::ZERO), origin());
        assert_eq!(
            clock.at(Duration::from_secs(2)),
            origin() + TimeDelta::minutes(2)
        );
        assert_eq!(
            clock.at(Duration::from_millis(500)),
            origin() + TimeDelta::seconds(30)
        );
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(SimClock::new(origin(), 0.0).scale(), MIN_SCALE);
        assert_eq!(SimClock::new(origin(), 1e9).scale(), MAX_SCALE);
    }

    #[test]
    fn stepping_the_scale() {
        let mut clock = SimClock::new(origin(), 1.0);
        clock.faster();
        assert_eq!(clock.scale(), 60.0);
        clock.faster();
        clock.faster();
        clock.faster();
        clock.faster();
        assert_eq!(clock.scale(), MAX_SCALE);
        clock.slower();
        assert_eq!(clock.scale(), 3600.0);

        let mut odd = SimClock::new(origin(), 100.0);
        odd.slower();
        assert_eq!(odd.scale(), 60.0);
    }

    #[test]
    fn rebasing_keeps_time_continuous() {
        let mut clock = SimClock::new(origin(), 3600.0);
        let before = clock.now();
        clock.set_scale(1.0);
        let after = clock.now();
        assert!(after >= before);
        assert!(after - before < TimeDelta::seconds(5));
    }
}
