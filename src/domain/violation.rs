//! Violation record - the packaged evidence handed to the uplink

use crate::domain::types::TargetId;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

fn serialize_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Immutable evidence bundle for one overspeed capture
///
/// Built only by the evidence packager. Image bytes serialize as base64.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationRecord {
    pub violation_id: String, // UUIDv7
    pub plate_number: String,
    pub speed_mph: f64,
    pub distance_miles: f64,
    pub distance_meters: f64,
    pub timestamp_ms: u64, // from the originating speed context
    pub target_id: TargetId,
    #[serde(serialize_with = "serialize_base64")]
    pub image_bytes: Vec<u8>,
}

impl ViolationRecord {
    /// Short summary used by the buffer inspection endpoint
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "violation_id": self.violation_id,
            "plate_number": self.plate_number,
            "speed_mph": self.speed_mph,
            "distance_meters": self.distance_meters,
            "timestamp_ms": self.timestamp_ms,
            "image_len": self.image_bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ViolationRecord {
        ViolationRecord {
            violation_id: new_uuid_v7(),
            plate_number: "ABC-1234".to_string(),
            speed_mph: 50.0,
            distance_miles: 0.0,
            distance_meters: 0.0,
            timestamp_ms: 1736012345678,
            target_id: TargetId::PRIMARY,
            image_bytes: b"fakeImageBytes".to_vec(),
        }
    }

    #[test]
    fn test_uuid_v7_generation() {
        let uuid1 = new_uuid_v7();
        let uuid2 = new_uuid_v7();

        assert_ne!(uuid1, uuid2);
        // UUIDv7 should be 36 chars with hyphens
        assert_eq!(uuid1.len(), 36);
    }

    #[test]
    fn test_record_serializes_image_as_base64() {
        let record = record();
        let parsed: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(parsed["plate_number"], "ABC-1234");
        assert_eq!(parsed["speed_mph"], 50.0);
        assert_eq!(parsed["target_id"], 1);
        assert_eq!(parsed["image_bytes"], "ZmFrZUltYWdlQnl0ZXM=");
    }

    #[test]
    fn test_summary() {
        let record = record();
        let summary = record.summary();
        assert_eq!(summary["violation_id"], record.violation_id.as_str());
        assert_eq!(summary["image_len"], 14);
    }
}
