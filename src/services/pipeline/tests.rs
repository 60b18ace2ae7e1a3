use super::*;
use crate::domain::types::{Frame, PlateInfo};
use crate::domain::units::meters_to_miles;

fn pipeline() -> Pipeline {
    Pipeline::new(&Config::default(), Arc::new(Metrics::new()))
}

fn at_m(distance_m: f64, speed_mph: f64) -> Reading {
    Reading::new(meters_to_miles(distance_m), speed_mph)
}

struct NoPlate;

impl Identifier for NoPlate {
    fn identify(&self, _frame: Option<&Frame>) -> Option<PlateInfo> {
        None
    }
}

#[test]
fn test_overspeed_at_sensor_produces_record() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(Reading::new(0.0, 50.0))).unwrap();

    assert!(trace.accepted);
    assert_eq!(trace.stage, Stage::Packager);
    assert_eq!(trace.region, Some(Region::CaptureWindow));
    assert!(trace.overspeed_context_present);
    assert_eq!(trace.capture_command, Some(CaptureCommand::Start));
    assert_eq!(trace.led_message.as_deref(), Some("OVERSPEED: 50.0 mph - SLOW DOWN"));

    let record = trace.violation_record.as_ref().unwrap();
    assert_eq!(record.speed_mph, 50.0);
    assert_eq!(record.plate_number, "ABC-1234");
    assert_eq!(trace.plate_number.as_deref(), Some("ABC-1234"));
    assert!(record.distance_meters.abs() < 1e-9);
}

#[test]
fn test_normal_speed_stops_at_evaluator() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(Reading::new(0.0, 30.0))).unwrap();

    assert!(trace.accepted);
    assert_eq!(trace.stage, Stage::OverspeedEvaluator);
    assert!(!trace.speed_status.unwrap().overspeed);
    assert!(!trace.overspeed_context_present);
    assert_eq!(trace.capture_command, None);
    assert!(!trace.is_violation());
    assert_eq!(trace.led_message.as_deref(), Some("Speed: 30.0 mph - OK"));
}

#[test]
fn test_far_reading_is_discarded() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(Reading::new(-0.1, 50.0))).unwrap();

    assert!(!trace.accepted);
    assert_eq!(trace.stage, Stage::ZoneClassifier);
    assert_eq!(trace.region, Some(Region::OutOfRangeBefore));
    assert!(trace.sample.is_none());
    assert!(trace.speed_status.is_none());
    assert!(trace.led_message.is_none());
}

#[test]
fn test_exit_step_issues_single_stop() {
    let mut p = pipeline();
    let mut stops = 0;
    let mut stop_distance = None;

    for miles in [-0.02, 0.02, 0.03] {
        let trace = p.evaluate(Some(Reading::new(miles, 50.0))).unwrap();
        if trace.capture_command == Some(CaptureCommand::Stop) {
            stops += 1;
            stop_distance = trace.distance_meters;
        }
    }

    assert_eq!(stops, 1);
    let d = stop_distance.unwrap();
    assert!(d > 20.0 && d < 40.0);
    assert_eq!(p.metrics.capture_stops(), 1);
}

#[test]
fn test_coarse_only_overspeed_not_escalated() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(at_m(-120.0, 70.0))).unwrap();

    assert!(trace.accepted);
    assert_eq!(trace.region, Some(Region::CoarseOnly));
    assert!(trace.speed_status.unwrap().overspeed);
    assert!(!trace.overspeed_context_present);
    assert_eq!(trace.stage, Stage::OverspeedEvaluator);
}

#[test]
fn test_monitor_zone_overspeed_is_no_change() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(at_m(-50.0, 70.0))).unwrap();

    assert!(trace.overspeed_context_present);
    assert_eq!(trace.capture_command, Some(CaptureCommand::NoChange));
    assert_eq!(trace.stage, Stage::CaptureWindow);
    assert!(!trace.is_violation());
}

#[test]
fn test_reset_then_fresh_start() {
    let mut p = pipeline();
    p.evaluate(Some(at_m(10.0, 50.0))).unwrap();
    p.evaluate(Some(at_m(30.0, 50.0))).unwrap();
    assert_eq!(p.phase(), TrackPhase::ExitSignaled);

    for d in [95.0, -160.0] {
        let trace = p.evaluate(Some(at_m(d, 50.0))).unwrap();
        assert!(!trace.accepted);
        assert_eq!(trace.phase, TrackPhase::Idle);

        let trace = p.evaluate(Some(at_m(0.0, 50.0))).unwrap();
        assert_eq!(trace.capture_command, Some(CaptureCommand::Start));
        assert!(trace.is_violation());
    }
}

#[test]
fn test_full_pass_sweep() {
    let mut p = pipeline();
    let mut leaving = 0;
    let mut starts = 0;
    let mut stops = 0;

    let mut d = -198.0;
    while d <= 150.0 {
        let trace = p.evaluate(Some(at_m(d, 55.0))).unwrap();
        if let Some(sample) = trace.sample {
            if sample.distance_meters > 20.0 {
                leaving += 1;
            }
        }
        match trace.capture_command {
            Some(CaptureCommand::Start) => starts += 1,
            Some(CaptureCommand::Stop) => stops += 1,
            _ => {}
        }
        d += 5.0;
    }

    assert_eq!(leaving, 1);
    assert_eq!(stops, 1);
    // -18 .. 17 inclusive at 5 m steps
    assert_eq!(starts, 8);
    assert_eq!(p.phase(), TrackPhase::Idle);
}

#[test]
fn test_empty_frame_rejected() {
    let mut p = pipeline().with_camera(Box::new(MockCamera::with_payload(Vec::new())));
    let trace = p.evaluate(Some(Reading::new(0.0, 50.0))).unwrap();

    assert_eq!(trace.capture_command, Some(CaptureCommand::Start));
    assert_eq!(trace.stage, Stage::FrameCollector);
    assert!(!trace.is_violation());
}

#[test]
fn test_missing_plate_stops_at_identifier() {
    let mut p = pipeline().with_identifier(Box::new(NoPlate));
    let trace = p.evaluate(Some(Reading::new(0.0, 50.0))).unwrap();

    assert_eq!(trace.stage, Stage::Identifier);
    assert!(trace.plate_number.is_none());
    assert!(!trace.is_violation());
}

#[test]
fn test_non_finite_reading_rejected() {
    let mut p = pipeline();
    let err = p.evaluate(Some(Reading::new(0.0, f64::NAN))).unwrap_err();
    assert!(matches!(err, ReadingError::NonFinite { field: "speed_mph", .. }));

    let summary = p.metrics.report(0);
    assert_eq!(summary.readings_rejected, 1);
    assert_eq!(summary.readings_total, 0);
}

#[test]
fn test_absent_reading() {
    let mut p = pipeline();
    let trace = p.evaluate(None).unwrap();
    assert!(!trace.accepted);
    assert!(trace.input.is_none());
    assert_eq!(p.metrics.readings_total(), 0);
}

#[test]
fn test_trace_serializes() {
    let mut p = pipeline();
    let trace = p.evaluate(Some(Reading::new(0.0, 50.0))).unwrap();
    let json = serde_json::to_value(&trace).unwrap();

    assert_eq!(json["stage"], "packager");
    assert_eq!(json["region"], "CAPTURE_WINDOW");
    assert_eq!(json["capture_command"], "start");
    assert_eq!(json["phase"], "tracking");
    assert_eq!(json["violation_record"]["image_bytes"], "ZmFrZUltYWdlQnl0ZXM=");
    assert!(json.get("upload_status").is_none());
}

#[test]
fn test_attach_upload() {
    let mut p = pipeline();
    let mut trace = p.evaluate(Some(Reading::new(0.0, 50.0))).unwrap();
    trace.attach_upload(UploadStatus {
        success: true,
        backend_record_id: Some("id".to_string()),
        retry_count: 0,
        message: "ok".to_string(),
        timestamp_ms: 1,
    });

    assert_eq!(trace.stage, Stage::Uplink);
    assert!(trace.upload_status.unwrap().success);
}
