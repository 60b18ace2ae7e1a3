//! Enforcement pipeline orchestration
//!
//! Runs one reading through every synchronous stage:
//! - Zone classification (per-target hysteresis)
//! - Overspeed evaluation (status always, context when escalated)
//! - Display update
//! - Capture window control
//! - Frame collection, plate identification and evidence packaging
//!
//! Uploading is async and happens outside the pipeline (see `EnforcementService`).

mod handlers;
#[cfg(test)]
mod tests;

use crate::domain::error::ReadingError;
use crate::domain::types::{
    CaptureCommand, Reading, SpeedStatus, TargetId, TrackedSample, UploadStatus,
};
use crate::domain::units::miles_to_meters;
use crate::domain::violation::ViolationRecord;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::anpr::{Identifier, MockAnpr};
use crate::io::camera::{FrameCollector, FrameSource, MockCamera};
use crate::io::display::{LedDisplay, SpeedDisplay};
use crate::services::capture_window::CaptureWindowController;
use crate::services::overspeed::OverspeedEvaluator;
use crate::services::packager::EvidencePackager;
use crate::services::region::{Region, RegionMap};
use crate::services::zone_classifier::{TrackPhase, ZoneClassifier};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Last stage a reading reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ZoneClassifier,
    OverspeedEvaluator,
    CaptureWindow,
    FrameCollector,
    Identifier,
    Packager,
    Uplink,
}

/// Stage-by-stage account of one reading
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub input: Option<Reading>,
    pub accepted: bool,
    pub stage: Stage,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    pub phase: TrackPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<TrackedSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_status: Option<SpeedStatus>,
    pub overspeed_context_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_command: Option<CaptureCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_record: Option<ViolationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<UploadStatus>,
}

impl PipelineTrace {
    fn new(input: Option<Reading>, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            input,
            accepted: false,
            stage,
            reason: reason.into(),
            distance_meters: None,
            region: None,
            phase: TrackPhase::Idle,
            sample: None,
            speed_status: None,
            overspeed_context_present: false,
            led_message: None,
            capture_command: None,
            plate_number: None,
            violation_record: None,
            upload_status: None,
        }
    }

    fn finish(&mut self, stage: Stage, reason: impl Into<String>) {
        self.stage = stage;
        self.reason = reason.into();
    }

    /// Attach the uplink outcome for the packaged record
    pub fn attach_upload(&mut self, status: UploadStatus) {
        let reason = if status.success {
            "Full evidence pipeline executed successfully.".to_string()
        } else {
            format!("Upload failed: {}", status.message)
        };
        self.finish(Stage::Uplink, reason);
        self.upload_status = Some(status);
    }

    pub fn is_violation(&self) -> bool {
        self.violation_record.is_some()
    }
}

/// Synchronous enforcement pipeline for the single tracked target
pub struct Pipeline {
    pub(crate) classifier: ZoneClassifier,
    pub(crate) evaluator: OverspeedEvaluator,
    pub(crate) capture: CaptureWindowController,
    pub(crate) packager: EvidencePackager,
    pub(crate) regions: RegionMap,
    pub(crate) display: Box<dyn SpeedDisplay>,
    pub(crate) camera: Box<dyn FrameSource>,
    pub(crate) frames: FrameCollector,
    pub(crate) identifier: Box<dyn Identifier>,
    pub(crate) metrics: Arc<Metrics>,
}

impl Pipeline {
    /// Build a pipeline with the stock display and mock camera / ANPR
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Self {
        Self {
            classifier: ZoneClassifier::from_config(config),
            evaluator: OverspeedEvaluator::from_config(config),
            capture: CaptureWindowController::from_config(config),
            packager: EvidencePackager::new(),
            regions: RegionMap::from_config(config),
            display: Box::new(LedDisplay::new()),
            camera: Box::new(MockCamera::new()),
            frames: FrameCollector::new(),
            identifier: Box::new(MockAnpr::new(config.anpr_plates().to_vec())),
            metrics,
        }
    }

    pub fn with_display(mut self, display: Box<dyn SpeedDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn with_camera(mut self, camera: Box<dyn FrameSource>) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_identifier(mut self, identifier: Box<dyn Identifier>) -> Self {
        self.identifier = identifier;
        self
    }

    /// Run one reading through every synchronous stage
    ///
    /// Non-finite readings are rejected with an error and leave state untouched.
    pub fn evaluate(&mut self, reading: Option<Reading>) -> Result<PipelineTrace, ReadingError> {
        let process_start = Instant::now();

        let Some(reading) = reading else {
            return Ok(PipelineTrace::new(None, Stage::ZoneClassifier, "No reading supplied."));
        };

        let outcome = match self.classifier.observe(TargetId::PRIMARY, &reading) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_rejected();
                return Err(e);
            }
        };

        let distance_m = miles_to_meters(reading.distance_miles);
        let mut trace = PipelineTrace::new(Some(reading), Stage::ZoneClassifier, "");
        trace.distance_meters = Some(distance_m);
        trace.region = Some(self.regions.classify(distance_m));

        self.handle_outcome(outcome, &mut trace);
        trace.phase = self.classifier.phase(TargetId::PRIMARY);

        // Record processing latency (lock-free)
        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_reading(latency_us);

        Ok(trace)
    }

    pub fn phase(&self) -> TrackPhase {
        self.classifier.phase(TargetId::PRIMARY)
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn threshold_mph(&self) -> f64 {
        self.evaluator.threshold_mph()
    }
}
