//! Overspeed evaluation
//!
//! Produces two independent outputs from one tracked sample:
//! - `status` - always available, drives the roadside display
//! - `context` - only for overspeed samples past the monitor floor, drives capture

use crate::domain::types::{SpeedContext, SpeedStatus, TrackedSample};
use crate::infra::config::Config;
use tracing::debug;

pub struct OverspeedEvaluator {
    limit_mph: f64,
    tolerance_ratio: f64,
    /// Samples at or below this distance (m) are coarse-only
    monitor_floor_m: f64,
}

impl OverspeedEvaluator {
    pub fn new(limit_mph: f64, tolerance_ratio: f64, monitor_floor_m: f64) -> Self {
        Self { limit_mph, tolerance_ratio, monitor_floor_m }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.speed_limit_mph(), config.tolerance_ratio(), config.monitor_floor_m())
    }

    /// Speed at or above which a sample is overspeed
    #[inline]
    pub fn threshold_mph(&self) -> f64 {
        self.limit_mph * (1.0 + self.tolerance_ratio)
    }

    #[inline]
    pub fn is_overspeed(&self, speed_mph: f64) -> bool {
        speed_mph >= self.threshold_mph()
    }

    pub fn status(&self, sample: &TrackedSample) -> SpeedStatus {
        SpeedStatus {
            speed_mph: sample.speed_mph,
            distance_miles: sample.distance_miles,
            overspeed: self.is_overspeed(sample.speed_mph),
        }
    }

    pub fn context(&self, sample: &TrackedSample) -> Option<SpeedContext> {
        if !self.is_overspeed(sample.speed_mph) {
            return None;
        }

        if sample.distance_meters <= self.monitor_floor_m {
            debug!(
                target_id = %sample.target_id,
                distance_m = %sample.distance_meters,
                speed_mph = %sample.speed_mph,
                "overspeed_coarse_only"
            );
            return None;
        }

        Some(SpeedContext {
            overspeed: true,
            speed_mph: sample.speed_mph,
            distance_miles: sample.distance_miles,
            distance_meters: sample.distance_meters,
            timestamp_ms: sample.timestamp_ms,
            target_id: sample.target_id,
        })
    }
}
