//! Roadside speed display
//!
//! The display is fed on every forwarded sample, overspeed or not.

use crate::domain::types::{DisplayCommand, SpeedStatus};

/// Renders a speed status into a display command
pub trait SpeedDisplay: Send + Sync {
    /// Must not fail on an absent status
    fn render(&self, status: Option<&SpeedStatus>) -> DisplayCommand;
}

/// LED matrix sign
#[derive(Debug, Default)]
pub struct LedDisplay;

impl LedDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl SpeedDisplay for LedDisplay {
    fn render(&self, status: Option<&SpeedStatus>) -> DisplayCommand {
        let Some(status) = status else {
            return DisplayCommand {
                speed_mph: 0.0,
                distance_miles: 0.0,
                overspeed: false,
                message: "NO SPEED DATA".to_string(),
            };
        };

        let message = if status.overspeed {
            format!("OVERSPEED: {:.1} mph - SLOW DOWN", status.speed_mph)
        } else {
            format!("Speed: {:.1} mph - OK", status.speed_mph)
        };

        DisplayCommand {
            speed_mph: status.speed_mph,
            distance_miles: status.distance_miles,
            overspeed: status.overspeed,
            message,
        }
    }
}
