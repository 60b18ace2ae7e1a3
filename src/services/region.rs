//! Six-band diagnostic region map
//!
//! Combines the zone limits, the overspeed monitor floor and the capture window
//! into one label per distance. Used by the debug endpoints and the simulator to
//! explain why a reading did or did not reach a given stage.

use crate::infra::config::Config;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    OutOfRangeBefore,
    CoarseOnly,
    MonitorOnly,
    CaptureWindow,
    LeavingStopCapture,
    OutOfRangeAfter,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::OutOfRangeBefore => "OUT_OF_RANGE_BEFORE",
            Region::CoarseOnly => "COARSE_ONLY",
            Region::MonitorOnly => "MONITOR_ONLY",
            Region::CaptureWindow => "CAPTURE_WINDOW",
            Region::LeavingStopCapture => "LEAVING_STOP_CAPTURE",
            Region::OutOfRangeAfter => "OUT_OF_RANGE_AFTER",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMap {
    min_valid_m: f64,
    monitor_floor_m: f64,
    capture_half_width_m: f64,
    max_valid_m: f64,
}

impl Default for RegionMap {
    fn default() -> Self {
        Self {
            min_valid_m: -150.0,
            monitor_floor_m: -90.0,
            capture_half_width_m: 20.0,
            max_valid_m: 90.0,
        }
    }
}

impl RegionMap {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_valid_m: config.min_valid_m(),
            monitor_floor_m: config.monitor_floor_m(),
            capture_half_width_m: config.capture_half_width_m(),
            max_valid_m: config.max_valid_m(),
        }
    }

    pub fn classify(&self, distance_m: f64) -> Region {
        if distance_m <= self.min_valid_m {
            Region::OutOfRangeBefore
        } else if distance_m <= self.monitor_floor_m {
            Region::CoarseOnly
        } else if distance_m <= -self.capture_half_width_m {
            Region::MonitorOnly
        } else if distance_m < self.capture_half_width_m {
            Region::CaptureWindow
        } else if distance_m <= self.max_valid_m {
            Region::LeavingStopCapture
        } else {
            Region::OutOfRangeAfter
        }
    }
}
