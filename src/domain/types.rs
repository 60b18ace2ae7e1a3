//! Shared value types for the enforcement pipeline
//!
//! Everything here is a plain value: built once by one stage, consumed by the
//! next, then dropped. Native units are miles / mph; SI distances are carried
//! alongside where a stage needs them.

use crate::domain::error::ReadingError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Newtype wrapper for target IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TargetId(pub u64);

impl TargetId {
    /// The single target tracked by this deployment
    pub const PRIMARY: TargetId = TargetId(1);
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw range-sensor measurement, one per sensor cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Signed longitudinal distance from the sensor (miles, negative = approaching)
    #[serde(alias = "distanceMiles")]
    pub distance_miles: f64,
    /// Measured speed (mph)
    #[serde(alias = "speedMph")]
    pub speed_mph: f64,
}

impl Reading {
    pub fn new(distance_miles: f64, speed_mph: f64) -> Self {
        Self { distance_miles, speed_mph }
    }

    /// Reject NaN / infinite values before they reach any stage
    pub fn validate(&self) -> Result<(), ReadingError> {
        if !self.distance_miles.is_finite() {
            return Err(ReadingError::NonFinite { field: "distance_miles", value: self.distance_miles });
        }
        if !self.speed_mph.is_finite() {
            return Err(ReadingError::NonFinite { field: "speed_mph", value: self.speed_mph });
        }
        Ok(())
    }
}

/// A reading the zone classifier decided to propagate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedSample {
    pub distance_miles: f64,
    pub distance_meters: f64,
    pub speed_mph: f64,
    pub timestamp_ms: u64,
    pub target_id: TargetId,
}

/// Always-on speed feedback for the roadside display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedStatus {
    pub speed_mph: f64,
    pub distance_miles: f64,
    pub overspeed: bool,
}

/// An overspeed sample inside the monitor zone
///
/// Only the overspeed evaluator constructs these, and only with `overspeed = true`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedContext {
    pub overspeed: bool,
    pub speed_mph: f64,
    pub distance_miles: f64,
    pub distance_meters: f64,
    pub timestamp_ms: u64,
    pub target_id: TargetId,
}

/// Camera + flash command issued by the capture window controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureCommand {
    /// Arm (or keep armed) camera and flash
    Start,
    /// Power camera and flash down
    Stop,
    /// Leave the hardware as it is
    NoChange,
}

impl CaptureCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureCommand::Start => "start",
            CaptureCommand::Stop => "stop",
            CaptureCommand::NoChange => "no_change",
        }
    }
}

/// Output of the capture window controller
///
/// `context` is present exactly when `command == Start`; the constructors are the
/// only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptureDecision {
    command: CaptureCommand,
    context: Option<SpeedContext>,
}

impl CaptureDecision {
    pub fn start(context: SpeedContext) -> Self {
        Self { command: CaptureCommand::Start, context: Some(context) }
    }

    pub fn stop() -> Self {
        Self { command: CaptureCommand::Stop, context: None }
    }

    pub fn no_change() -> Self {
        Self { command: CaptureCommand::NoChange, context: None }
    }

    pub fn command(&self) -> CaptureCommand {
        self.command
    }

    /// Context to forward for evidence packaging
    pub fn context(&self) -> Option<&SpeedContext> {
        self.context.as_ref()
    }
}

/// Raw camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image_bytes: Vec<u8>,
    pub timestamp_ms: u64,
}

/// ANPR result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateInfo {
    pub plate_number: String,
    pub timestamp_ms: u64,
}

/// Formatted output for the roadside LED display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCommand {
    pub speed_mph: f64,
    pub distance_miles: f64,
    pub overspeed: bool,
    pub message: String,
}

/// Outcome of handing a violation record to the uplink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_record_id: Option<String>,
    pub retry_count: u32,
    pub message: String,
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_at(distance_meters: f64) -> SpeedContext {
        SpeedContext {
            overspeed: true,
            speed_mph: 50.0,
            distance_miles: distance_meters / 1609.344,
            distance_meters,
            timestamp_ms: 0,
            target_id: TargetId::PRIMARY,
        }
    }

    #[test]
    fn test_reading_validate() {
        assert!(Reading::new(0.0, 50.0).validate().is_ok());
        assert!(Reading::new(-0.1, 0.0).validate().is_ok());

        let err = Reading::new(f64::NAN, 50.0).validate().unwrap_err();
        assert!(matches!(err, ReadingError::NonFinite { field: "distance_miles", .. }));

        let err = Reading::new(0.0, f64::INFINITY).validate().unwrap_err();
        assert!(matches!(err, ReadingError::NonFinite { field: "speed_mph", .. }));
    }

    #[test]
    fn test_capture_decision_constructors() {
        let start = CaptureDecision::start(context_at(0.0));
        assert_eq!(start.command(), CaptureCommand::Start);
        assert!(start.context().is_some());

        assert_eq!(CaptureDecision::stop().command(), CaptureCommand::Stop);
        assert!(CaptureDecision::stop().context().is_none());
        assert_eq!(CaptureDecision::no_change().command(), CaptureCommand::NoChange);
        assert!(CaptureDecision::no_change().context().is_none());
    }

    #[test]
    fn test_capture_command_serializes_snake_case() {
        let json = serde_json::to_string(&CaptureCommand::NoChange).unwrap();
        assert_eq!(json, "\"no_change\"");
        assert_eq!(CaptureCommand::Start.as_str(), "start");
    }

    #[test]
    fn test_target_id_display() {
        assert_eq!(TargetId::PRIMARY.to_string(), "1");
    }
}
