//! Distance-zone classification with a one-shot leaving signal
//!
//! Zones (meters, `d` = signed distance from the sensor):
//!
//! ```text
//!   d <= min_valid                      OUT_OF_RANGE_BEFORE  discard, reset
//!   min_valid < d <= leaving_threshold  ACTIVE_MONITOR       always forward
//!   leaving_threshold < d <= max_valid  LEAVING              forward first crossing only
//!   d > max_valid                       OUT_OF_RANGE_AFTER   discard, reset
//! ```
//!
//! Exactly one sample beyond the leaving threshold is forwarded per pass, and only
//! when the previous reading for the same target was observed at or before it.

use crate::domain::error::ReadingError;
use crate::domain::types::{epoch_ms, Reading, TargetId, TrackedSample};
use crate::domain::units::miles_to_meters;
use crate::infra::config::Config;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info};

/// Distance band a reading falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    OutOfRangeBefore,
    ActiveMonitor,
    Leaving,
    OutOfRangeAfter,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::OutOfRangeBefore => "out_of_range_before",
            Band::ActiveMonitor => "active_monitor",
            Band::Leaving => "leaving",
            Band::OutOfRangeAfter => "out_of_range_after",
        }
    }
}

/// Result of classifying one reading
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneOutcome {
    /// Outside the tracking envelope; target state was reset
    Discarded(Band),
    /// Worth propagating downstream
    Forwarded(TrackedSample),
    /// Inside the leaving zone after the leaving sample was already sent
    Suppressed,
}

impl ZoneOutcome {
    pub fn into_sample(self) -> Option<TrackedSample> {
        match self {
            ZoneOutcome::Forwarded(sample) => Some(sample),
            _ => None,
        }
    }
}

/// Hysteresis state for one target
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneState {
    pub last_distance_m: Option<f64>,
    pub exit_signal_sent: bool,
}

/// Lifecycle phase of a target, derived from its `ZoneState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackPhase {
    Idle,
    Tracking,
    ExitSignaled,
}

/// Zone boundaries in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneLimits {
    pub min_valid_m: f64,
    pub leaving_threshold_m: f64,
    pub max_valid_m: f64,
}

impl Default for ZoneLimits {
    fn default() -> Self {
        Self { min_valid_m: -150.0, leaving_threshold_m: 20.0, max_valid_m: 90.0 }
    }
}

impl ZoneLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_valid_m: config.min_valid_m(),
            leaving_threshold_m: config.leaving_threshold_m(),
            max_valid_m: config.max_valid_m(),
        }
    }

    pub fn band(&self, distance_m: f64) -> Band {
        if distance_m <= self.min_valid_m {
            Band::OutOfRangeBefore
        } else if distance_m <= self.leaving_threshold_m {
            Band::ActiveMonitor
        } else if distance_m <= self.max_valid_m {
            Band::Leaving
        } else {
            Band::OutOfRangeAfter
        }
    }
}

/// Per-target zone tracker
///
/// Owns every target's `ZoneState`; callers serialize access per target.
pub struct ZoneClassifier {
    limits: ZoneLimits,
    states: FxHashMap<TargetId, ZoneState>,
}

impl ZoneClassifier {
    pub fn new(limits: ZoneLimits) -> Self {
        Self { limits, states: FxHashMap::default() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ZoneLimits::from_config(config))
    }

    pub fn limits(&self) -> &ZoneLimits {
        &self.limits
    }

    /// Classify a reading for the single tracked target
    ///
    /// An absent reading yields no output and leaves state untouched.
    pub fn process(&mut self, reading: Option<&Reading>) -> Result<Option<TrackedSample>, ReadingError> {
        let Some(reading) = reading else {
            return Ok(None);
        };
        Ok(self.observe(TargetId::PRIMARY, reading)?.into_sample())
    }

    /// Classify a reading for `target`, updating its hysteresis state
    pub fn observe(&mut self, target: TargetId, reading: &Reading) -> Result<ZoneOutcome, ReadingError> {
        reading.validate()?;

        let distance_m = miles_to_meters(reading.distance_miles);
        let band = self.limits.band(distance_m);

        match band {
            Band::OutOfRangeBefore | Band::OutOfRangeAfter => {
                if self.states.remove(&target).is_some() {
                    debug!(
                        target_id = %target,
                        distance_m = %distance_m,
                        band = band.as_str(),
                        "zone_state_reset"
                    );
                }
                Ok(ZoneOutcome::Discarded(band))
            }
            Band::ActiveMonitor => {
                let state = self.states.entry(target).or_default();
                state.last_distance_m = Some(distance_m);
                state.exit_signal_sent = false;
                Ok(ZoneOutcome::Forwarded(Self::sample(target, reading, distance_m)))
            }
            Band::Leaving => {
                let threshold = self.limits.leaving_threshold_m;
                let state = self.states.entry(target).or_default();
                let crossed = !state.exit_signal_sent
                    && matches!(state.last_distance_m, Some(prev) if prev <= threshold);
                state.last_distance_m = Some(distance_m);

                if crossed {
                    state.exit_signal_sent = true;
                    info!(target_id = %target, distance_m = %distance_m, "leaving_signal_emitted");
                    Ok(ZoneOutcome::Forwarded(Self::sample(target, reading, distance_m)))
                } else {
                    debug!(target_id = %target, distance_m = %distance_m, "leaving_sample_suppressed");
                    Ok(ZoneOutcome::Suppressed)
                }
            }
        }
    }

    /// Current lifecycle phase for `target`
    pub fn phase(&self, target: TargetId) -> TrackPhase {
        match self.states.get(&target) {
            None => TrackPhase::Idle,
            Some(state) if state.exit_signal_sent => TrackPhase::ExitSignaled,
            Some(_) => TrackPhase::Tracking,
        }
    }

    /// Snapshot of a target's hysteresis state (`None` when idle)
    pub fn state(&self, target: TargetId) -> Option<ZoneState> {
        self.states.get(&target).copied()
    }

    pub fn tracked_targets(&self) -> usize {
        self.states.len()
    }

    fn sample(target: TargetId, reading: &Reading, distance_m: f64) -> TrackedSample {
        TrackedSample {
            distance_miles: reading.distance_miles,
            distance_meters: distance_m,
            speed_mph: reading.speed_mph,
            timestamp_ms: epoch_ms(),
            target_id: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::units::meters_to_miles;

    fn at_m(distance_m: f64) -> Reading {
        Reading::new(meters_to_miles(distance_m), 50.0)
    }

    fn classifier() -> ZoneClassifier {
        ZoneClassifier::new(ZoneLimits::default())
    }

    #[test]
    fn test_band_boundaries() {
        let limits = ZoneLimits::default();
        assert_eq!(limits.band(-150.0), Band::OutOfRangeBefore);
        assert_eq!(limits.band(-149.9), Band::ActiveMonitor);
        assert_eq!(limits.band(20.0), Band::ActiveMonitor);
        assert_eq!(limits.band(20.1), Band::Leaving);
        assert_eq!(limits.band(90.0), Band::Leaving);
        assert_eq!(limits.band(90.1), Band::OutOfRangeAfter);
    }

    #[test]
    fn test_sweep_emits_single_leaving_sample() {
        for step in [1.0, 2.5, 5.0, 7.0, 10.0] {
            let mut zc = classifier();
            let mut leaving = 0;
            let mut d = -200.0;
            while d <= 150.0 {
                if let Some(sample) = zc.process(Some(&at_m(d))).unwrap() {
                    if sample.distance_meters > 20.0 {
                        leaving += 1;
                    }
                }
                d += step;
            }
            assert_eq!(leaving, 1, "step {}", step);
            assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Idle);
        }
    }

    #[test]
    fn test_active_zone_always_forwards() {
        let mut zc = classifier();
        for d in [-140.0, -90.0, -20.0, 0.0, 0.0, 19.9] {
            assert!(matches!(
                zc.observe(TargetId::PRIMARY, &at_m(d)).unwrap(),
                ZoneOutcome::Forwarded(_)
            ));
        }
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Tracking);
    }

    #[test]
    fn test_out_of_range_discards_and_resets() {
        let mut zc = classifier();
        zc.process(Some(&at_m(10.0))).unwrap();
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Tracking);

        let outcome = zc.observe(TargetId::PRIMARY, &at_m(-160.0)).unwrap();
        assert_eq!(outcome, ZoneOutcome::Discarded(Band::OutOfRangeBefore));
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Idle);
        assert!(zc.state(TargetId::PRIMARY).is_none());

        zc.process(Some(&at_m(10.0))).unwrap();
        zc.process(Some(&at_m(30.0))).unwrap();
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::ExitSignaled);

        let outcome = zc.observe(TargetId::PRIMARY, &at_m(95.0)).unwrap();
        assert_eq!(outcome, ZoneOutcome::Discarded(Band::OutOfRangeAfter));
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Idle);
    }

    #[test]
    fn test_mid_leaving_start_is_suppressed() {
        let mut zc = classifier();
        assert_eq!(zc.observe(TargetId::PRIMARY, &at_m(40.0)).unwrap(), ZoneOutcome::Suppressed);
        assert_eq!(zc.observe(TargetId::PRIMARY, &at_m(50.0)).unwrap(), ZoneOutcome::Suppressed);

        // Suppressed calls still record the last distance
        let state = zc.state(TargetId::PRIMARY).unwrap();
        assert_eq!(state.last_distance_m, Some(miles_to_meters(meters_to_miles(50.0))));
        assert!(!state.exit_signal_sent);
    }

    #[test]
    fn test_return_to_active_rearms_leaving_signal() {
        let mut zc = classifier();
        zc.process(Some(&at_m(0.0))).unwrap();
        assert!(zc.process(Some(&at_m(30.0))).unwrap().is_some());
        assert!(zc.process(Some(&at_m(40.0))).unwrap().is_none());

        // Back inside the active zone, then out again
        assert!(zc.process(Some(&at_m(10.0))).unwrap().is_some());
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Tracking);
        assert!(zc.process(Some(&at_m(30.0))).unwrap().is_some());
    }

    #[test]
    fn test_absent_reading_yields_nothing() {
        let mut zc = classifier();
        zc.process(Some(&at_m(0.0))).unwrap();
        assert_eq!(zc.process(None).unwrap(), None);
        assert_eq!(zc.phase(TargetId::PRIMARY), TrackPhase::Tracking);
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let mut zc = classifier();
        let err = zc.process(Some(&Reading::new(f64::NAN, 50.0))).unwrap_err();
        assert!(matches!(err, ReadingError::NonFinite { field: "distance_miles", .. }));

        let err = zc.process(Some(&Reading::new(0.0, f64::NEG_INFINITY))).unwrap_err();
        assert!(matches!(err, ReadingError::NonFinite { field: "speed_mph", .. }));
        assert_eq!(zc.tracked_targets(), 0);
    }

    #[test]
    fn test_targets_have_independent_state() {
        let mut zc = classifier();
        let a = TargetId(1);
        let b = TargetId(2);

        zc.observe(a, &at_m(10.0)).unwrap();
        assert!(matches!(zc.observe(a, &at_m(30.0)).unwrap(), ZoneOutcome::Forwarded(_)));

        // b never observed at or before the threshold
        assert_eq!(zc.observe(b, &at_m(30.0)).unwrap(), ZoneOutcome::Suppressed);
        assert_eq!(zc.phase(a), TrackPhase::ExitSignaled);
        assert_eq!(zc.phase(b), TrackPhase::Tracking);

        zc.observe(a, &at_m(200.0)).unwrap();
        assert_eq!(zc.phase(a), TrackPhase::Idle);
        assert_eq!(zc.phase(b), TrackPhase::Tracking);
    }

    #[test]
    fn test_sample_carries_reading_values() {
        let mut zc = classifier();
        let sample = zc.process(Some(&Reading::new(0.01, 42.0))).unwrap().unwrap();
        assert_eq!(sample.distance_miles, 0.01);
        assert_eq!(sample.speed_mph, 42.0);
        assert!((sample.distance_meters - 16.09344).abs() < 1e-9);
        assert_eq!(sample.target_id, TargetId::PRIMARY);
        assert!(sample.timestamp_ms > 0);
    }
}
