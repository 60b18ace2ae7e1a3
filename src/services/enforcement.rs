//! Enforcement service - shared entry point for readings
//!
//! Serializes readings through the pipeline behind a mutex, then uploads any
//! packaged record after the lock is released.

use crate::domain::error::ReadingError;
use crate::domain::types::Reading;
use crate::domain::violation::ViolationRecord;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::uplink::{MockUplink, Uplink};
use crate::services::pipeline::{Pipeline, PipelineTrace};
use crate::services::zone_classifier::TrackPhase;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EnforcementService {
    pipeline: Mutex<Pipeline>,
    uplink: Arc<dyn Uplink>,
    metrics: Arc<Metrics>,
    site_id: String,
}

impl EnforcementService {
    pub fn new(pipeline: Pipeline, uplink: Arc<dyn Uplink>, metrics: Arc<Metrics>, site_id: &str) -> Self {
        Self { pipeline: Mutex::new(pipeline), uplink, metrics, site_id: site_id.to_string() }
    }

    /// Wire the stock pipeline with the mock uplink
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Self {
        let pipeline = Pipeline::new(config, metrics.clone());
        let uplink =
            MockUplink::new(config.uplink_buffer_capacity()).with_metrics(metrics.clone());
        Self::new(pipeline, Arc::new(uplink), metrics, config.site_id())
    }

    /// Process one reading end to end
    ///
    /// Readings are evaluated strictly in arrival order; only the upload runs
    /// outside the pipeline lock.
    pub async fn ingest(&self, reading: Reading) -> Result<PipelineTrace, ReadingError> {
        let mut trace = {
            let mut pipeline = self.pipeline.lock();
            pipeline.evaluate(Some(reading))?
        };

        if let Some(record) = trace.violation_record.clone() {
            let status = self.uplink.upload(Some(record)).await;
            self.metrics.record_upload(status.success);
            if !status.success {
                warn!(message = %status.message, "violation_upload_failed");
            }
            trace.attach_upload(status);
        }

        debug!(
            stage = ?trace.stage,
            accepted = %trace.accepted,
            phase = ?trace.phase,
            "reading_processed"
        );
        Ok(trace)
    }

    pub fn phase(&self) -> TrackPhase {
        self.pipeline.lock().phase()
    }

    pub fn threshold_mph(&self) -> f64 {
        self.pipeline.lock().threshold_mph()
    }

    pub fn buffered_records(&self) -> Vec<ViolationRecord> {
        self.uplink.buffered()
    }

    pub fn clear_buffer(&self) -> usize {
        self.uplink.clear()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }
}
