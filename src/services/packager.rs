//! Evidence packaging
//!
//! Aggregates a speed context, a plate and a frame into a `ViolationRecord`.
//! Any absent input yields no record. A context without the overspeed flag is
//! also rejected and logged, since upstream gating should make it unreachable.

use crate::domain::types::{Frame, PlateInfo, SpeedContext};
use crate::domain::violation::{new_uuid_v7, ViolationRecord};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct EvidencePackager;

impl EvidencePackager {
    pub fn new() -> Self {
        Self
    }

    pub fn package(
        &self,
        context: Option<&SpeedContext>,
        plate: Option<&PlateInfo>,
        frame: Option<&Frame>,
    ) -> Option<ViolationRecord> {
        let (Some(ctx), Some(plate), Some(frame)) = (context, plate, frame) else {
            debug!(
                context = context.is_some(),
                plate = plate.is_some(),
                frame = frame.is_some(),
                "package_missing_input"
            );
            return None;
        };

        if !ctx.overspeed {
            warn!(
                target_id = %ctx.target_id,
                speed_mph = %ctx.speed_mph,
                "package_rejected_not_overspeed"
            );
            return None;
        }

        let record = ViolationRecord {
            violation_id: new_uuid_v7(),
            plate_number: plate.plate_number.clone(),
            speed_mph: ctx.speed_mph,
            distance_miles: ctx.distance_miles,
            distance_meters: ctx.distance_meters,
            timestamp_ms: ctx.timestamp_ms,
            target_id: ctx.target_id,
            image_bytes: frame.image_bytes.clone(),
        };

        info!(
            violation_id = %record.violation_id,
            plate = %record.plate_number,
            speed_mph = %record.speed_mph,
            "violation_packaged"
        );
        Some(record)
    }
}
