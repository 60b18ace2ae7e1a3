//! Plate identification (ANPR)

use crate::domain::types::{epoch_ms, Frame, PlateInfo};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reads a plate from a frame
///
/// Absent input must give absent output.
pub trait Identifier: Send + Sync {
    fn identify(&self, frame: Option<&Frame>) -> Option<PlateInfo>;
}

/// Stand-in identifier cycling through a fixed plate pool
pub struct MockAnpr {
    plates: Vec<String>,
    next: AtomicUsize,
}

impl MockAnpr {
    pub fn new(plates: Vec<String>) -> Self {
        Self { plates, next: AtomicUsize::new(0) }
    }
}

impl Identifier for MockAnpr {
    fn identify(&self, frame: Option<&Frame>) -> Option<PlateInfo> {
        let frame = frame?;
        if frame.image_bytes.is_empty() || self.plates.is_empty() {
            return None;
        }

        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.plates.len();
        Some(PlateInfo { plate_number: self.plates[idx].clone(), timestamp_ms: epoch_ms() })
    }
}
