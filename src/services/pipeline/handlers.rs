//! Stage handlers for the enforcement pipeline
//!
//! Each handler records what its stage produced on the trace and either hands
//! off to the next stage or closes the trace with a reason.

use super::{Pipeline, PipelineTrace, Stage};
use crate::domain::types::{CaptureCommand, SpeedContext, TrackedSample};
use crate::services::zone_classifier::ZoneOutcome;
use tracing::debug;

impl Pipeline {
    /// Dispatch on the zone classifier's verdict
    pub(crate) fn handle_outcome(&mut self, outcome: ZoneOutcome, trace: &mut PipelineTrace) {
        match outcome {
            ZoneOutcome::Discarded(band) => {
                self.metrics.record_filtered();
                debug!(band = band.as_str(), "reading_discarded");
                trace.finish(
                    Stage::ZoneClassifier,
                    format!("Reading outside the tracking envelope ({}).", band.as_str()),
                );
            }
            ZoneOutcome::Suppressed => {
                self.metrics.record_filtered();
                trace.finish(
                    Stage::ZoneClassifier,
                    "Leaving-zone sample suppressed; stop already signaled or crossing not observed.",
                );
            }
            ZoneOutcome::Forwarded(sample) => {
                trace.accepted = true;
                trace.sample = Some(sample);
                self.handle_sample(&sample, trace);
            }
        }
    }

    /// Speed evaluation and display for a forwarded sample
    fn handle_sample(&mut self, sample: &TrackedSample, trace: &mut PipelineTrace) {
        let status = self.evaluator.status(sample);
        let context = self.evaluator.context(sample);
        self.metrics.record_sample(status.overspeed);

        // Display is updated on every forwarded sample
        let display = self.display.render(Some(&status));
        trace.led_message = Some(display.message);
        trace.speed_status = Some(status);
        trace.overspeed_context_present = context.is_some();

        let Some(ctx) = context else {
            trace.finish(
                Stage::OverspeedEvaluator,
                "No speed context (not overspeed or coarse-only region).",
            );
            return;
        };

        self.metrics.record_context();
        self.handle_context(&ctx, trace);
    }

    /// Capture window control for an escalated sample
    fn handle_context(&mut self, ctx: &SpeedContext, trace: &mut PipelineTrace) {
        let decision = self.capture.handle(Some(ctx));
        trace.capture_command = Some(decision.command());

        match decision.command() {
            CaptureCommand::NoChange => {
                trace.finish(Stage::CaptureWindow, "Overspeed but before the capture window.");
            }
            CaptureCommand::Stop => {
                self.metrics.record_capture_stop();
                trace.finish(Stage::CaptureWindow, "Overspeed past the capture window; capture stopped.");
            }
            CaptureCommand::Start => {
                self.metrics.record_capture_start();
                self.collect_evidence(decision.context(), trace);
            }
        }
    }

    /// Frame, plate and packaging for an armed capture
    fn collect_evidence(&mut self, ctx: Option<&SpeedContext>, trace: &mut PipelineTrace) {
        let Some(frame) = self.frames.accept(self.camera.capture()) else {
            trace.finish(Stage::FrameCollector, "Frame rejected.");
            return;
        };

        let Some(plate) = self.identifier.identify(Some(&frame)) else {
            trace.finish(Stage::Identifier, "No plate identified.");
            return;
        };
        trace.plate_number = Some(plate.plate_number.clone());

        let Some(record) = self.packager.package(ctx, Some(&plate), Some(&frame)) else {
            trace.finish(Stage::Packager, "No violation record produced.");
            return;
        };

        self.metrics.record_violation();
        trace.violation_record = Some(record);
        trace.finish(Stage::Packager, "Violation packaged; awaiting upload.");
    }
}
