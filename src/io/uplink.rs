//! Backend uplink for violation records
//!
//! The mock uplink accepts every record, assigns a backend id and keeps the
//! record in a bounded in-memory holding buffer (oldest evicted first).

use crate::domain::types::{epoch_ms, UploadStatus};
use crate::domain::violation::{new_uuid_v7, ViolationRecord};
use crate::infra::metrics::Metrics;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

/// Hands violation records to the central backend
///
/// An absent record is an immediate, non-retriable failure.
#[async_trait]
pub trait Uplink: Send + Sync {
    async fn upload(&self, record: Option<ViolationRecord>) -> UploadStatus;

    /// Records currently held locally
    fn buffered(&self) -> Vec<ViolationRecord>;

    /// Drop all locally held records, returning how many were removed
    fn clear(&self) -> usize;
}

pub(crate) fn absent_record_status() -> UploadStatus {
    UploadStatus {
        success: false,
        backend_record_id: None,
        retry_count: 0,
        message: "ViolationRecord is absent, nothing to upload.".to_string(),
        timestamp_ms: epoch_ms(),
    }
}

pub struct MockUplink {
    buffer: Mutex<VecDeque<ViolationRecord>>,
    capacity: usize,
    metrics: Option<Arc<Metrics>>,
}

impl MockUplink {
    pub fn new(capacity: usize) -> Self {
        Self { buffer: Mutex::new(VecDeque::new()), capacity: capacity.max(1), metrics: None }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    fn hold(&self, record: ViolationRecord) {
        let mut buffer = self.buffer.lock();
        while buffer.len() >= self.capacity {
            if let Some(evicted) = buffer.pop_front() {
                warn!(violation_id = %evicted.violation_id, "uplink_buffer_evicted");
                if let Some(ref m) = self.metrics {
                    m.record_buffer_eviction();
                }
            }
        }
        buffer.push_back(record);
    }
}

#[async_trait]
impl Uplink for MockUplink {
    async fn upload(&self, record: Option<ViolationRecord>) -> UploadStatus {
        let Some(record) = record else {
            return absent_record_status();
        };

        let backend_record_id = new_uuid_v7();
        info!(
            violation_id = %record.violation_id,
            backend_record_id = %backend_record_id,
            "violation_uploaded"
        );
        self.hold(record);

        UploadStatus {
            success: true,
            backend_record_id: Some(backend_record_id),
            retry_count: 0,
            message: "ViolationRecord uploaded (simulated) successfully.".to_string(),
            timestamp_ms: epoch_ms(),
        }
    }

    fn buffered(&self) -> Vec<ViolationRecord> {
        self.buffer.lock().iter().cloned().collect()
    }

    fn clear(&self) -> usize {
        let mut buffer = self.buffer.lock();
        let n = buffer.len();
        buffer.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TargetId;

    fn record(plate: &str) -> ViolationRecord {
        ViolationRecord {
            violation_id: new_uuid_v7(),
            plate_number: plate.to_string(),
            speed_mph: 50.0,
            distance_miles: 0.0,
            distance_meters: 0.0,
            timestamp_ms: 1,
            target_id: TargetId::PRIMARY,
            image_bytes: b"img".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_success() {
        let uplink = MockUplink::new(10);
        let status = uplink.upload(Some(record("ABC-1234"))).await;

        assert!(status.success);
        assert!(status.backend_record_id.is_some());
        assert_eq!(status.retry_count, 0);
        assert_eq!(uplink.len(), 1);
    }

    #[tokio::test]
    async fn test_absent_record_fails_without_retry() {
        let uplink = MockUplink::new(10);
        let status = uplink.upload(None).await;

        assert!(!status.success);
        assert!(status.backend_record_id.is_none());
        assert_eq!(status.retry_count, 0);
        assert!(uplink.is_empty());
    }

    #[tokio::test]
    async fn test_buffer_evicts_oldest() {
        let metrics = Arc::new(Metrics::new());
        let uplink = MockUplink::new(2).with_metrics(metrics.clone());

        for plate in ["A", "B", "C"] {
            uplink.upload(Some(record(plate))).await;
        }

        let plates: Vec<String> = uplink.buffered().into_iter().map(|r| r.plate_number).collect();
        assert_eq!(plates, vec!["B", "C"]);
        assert_eq!(metrics.report(0).buffer_evictions, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let uplink = MockUplink::new(10);
        uplink.upload(Some(record("A"))).await;
        uplink.upload(Some(record("B"))).await;

        assert_eq!(uplink.clear(), 2);
        assert!(uplink.is_empty());
    }
}
