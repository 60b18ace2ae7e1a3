//! Capture window control
//!
//! Maps the distance carried by a speed context to a camera/flash command:
//!
//! ```text
//!   d <= -W       NoChange
//!   -W < d < W    Start (context forwarded for packaging)
//!   d >= W        Stop
//! ```
//!
//! Overspeed is not re-evaluated here.

use crate::domain::types::{CaptureDecision, SpeedContext};
use crate::infra::config::Config;
use tracing::{debug, info};

pub struct CaptureWindowController {
    half_width_m: f64,
}

impl CaptureWindowController {
    pub fn new(half_width_m: f64) -> Self {
        Self { half_width_m }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capture_half_width_m())
    }

    pub fn half_width_m(&self) -> f64 {
        self.half_width_m
    }

    pub fn handle(&self, context: Option<&SpeedContext>) -> CaptureDecision {
        let Some(ctx) = context else {
            return CaptureDecision::no_change();
        };
        let d = ctx.distance_meters;

        if d <= -self.half_width_m {
            debug!(target_id = %ctx.target_id, distance_m = %d, "capture_before_window");
            CaptureDecision::no_change()
        } else if d < self.half_width_m {
            debug!(target_id = %ctx.target_id, distance_m = %d, "capture_start");
            CaptureDecision::start(*ctx)
        } else {
            info!(target_id = %ctx.target_id, distance_m = %d, "capture_stop");
            CaptureDecision::stop()
        }
    }
}
