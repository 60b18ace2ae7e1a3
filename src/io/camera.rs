//! Camera frame source and frame validation

use crate::domain::types::{epoch_ms, Frame};
use tracing::debug;

/// Produces a frame on demand once capture is armed
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> Option<Frame>;
}

/// Stand-in camera returning a fixed payload
#[derive(Debug, Clone)]
pub struct MockCamera {
    payload: Vec<u8>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self { payload: b"fakeImageBytes".to_vec() }
    }

    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self { payload }
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for MockCamera {
    fn capture(&self) -> Option<Frame> {
        Some(Frame { image_bytes: self.payload.clone(), timestamp_ms: epoch_ms() })
    }
}

/// Gate between the camera and the identifier
#[derive(Debug, Default)]
pub struct FrameCollector;

impl FrameCollector {
    pub fn new() -> Self {
        Self
    }

    /// Pass a frame through unless it is absent or empty
    pub fn accept(&self, frame: Option<Frame>) -> Option<Frame> {
        match frame {
            Some(frame) if !frame.image_bytes.is_empty() => Some(frame),
            Some(_) => {
                debug!("frame_rejected_empty");
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_camera_payload() {
        let frame = MockCamera::new().capture().unwrap();
        assert_eq!(frame.image_bytes, b"fakeImageBytes".to_vec());
        assert!(frame.timestamp_ms > 0);
    }

    #[test]
    fn test_collector_rejects_empty_and_absent() {
        let collector = FrameCollector::new();
        assert!(collector.accept(None).is_none());
        assert!(collector.accept(MockCamera::with_payload(Vec::new()).capture()).is_none());
        assert!(collector.accept(MockCamera::new().capture()).is_some());
    }
}
