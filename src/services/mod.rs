//! Services - enforcement logic and state management
//!
//! This module contains the core enforcement services:
//! - `zone_classifier` - Per-target distance zones and leaving hysteresis
//! - `overspeed` - Speed status and overspeed context
//! - `capture_window` - Camera/flash start, stop or no-change decisions
//! - `packager` - Violation record assembly
//! - `region` - Six-band diagnostic region map
//! - `pipeline` - Synchronous stage orchestration with a per-reading trace
//! - `enforcement` - Shared service combining the pipeline with the uplink

pub mod capture_window;
pub mod enforcement;
pub mod overspeed;
pub mod packager;
pub mod pipeline;
pub mod region;
pub mod zone_classifier;

// Re-export commonly used types
pub use enforcement::EnforcementService;
pub use pipeline::{Pipeline, PipelineTrace, Stage};
pub use region::{Region, RegionMap};
pub use zone_classifier::{TrackPhase, ZoneClassifier, ZoneOutcome};
