//! Domain models - value types flowing through the enforcement pipeline
//!
//! - `types` - readings, samples, speed status/context, capture decisions
//! - `violation` - the packaged `ViolationRecord`
//! - `units` - miles/mph <-> SI conversion
//! - `error` - typed errors for malformed input

pub mod error;
pub mod types;
pub mod units;
pub mod violation;

// Re-export commonly used types at module level
pub use error::ReadingError;
pub use types::{
    CaptureCommand, CaptureDecision, DisplayCommand, Frame, PlateInfo, Reading, SpeedContext,
    SpeedStatus, TargetId, TrackedSample, UploadStatus,
};
pub use violation::ViolationRecord;
