//! IO modules - external system interfaces
//!
//! This module contains the collaborators around the enforcement core:
//! - `display` - Roadside LED speed display
//! - `camera` - Frame source and frame validation
//! - `anpr` - Plate identification
//! - `uplink` - Backend upload with in-memory holding buffer
//! - `prometheus` - Prometheus text exposition
//! - `http_api` - HTTP ingest, debug and metrics endpoints

pub mod anpr;
pub mod camera;
pub mod display;
pub mod http_api;
pub mod prometheus;
pub mod uplink;

// Re-export commonly used types
pub use anpr::{Identifier, MockAnpr};
pub use camera::{FrameCollector, FrameSource, MockCamera};
pub use display::{LedDisplay, SpeedDisplay};
pub use http_api::start_http_server;
pub use uplink::{MockUplink, Uplink};
