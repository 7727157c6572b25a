//! Posture camera reports, e.g. `{"activity": "Sitting", "device_id": "camera-01"}`.

use log::warn;

use crate::models::Activity;
use crate::vitals::Payload;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostureReport {
    pub device_id: Option<String>,
    /// `None` when the camera sent no label or one we don't recognise.
    pub activity: Option<Activity>,
    pub fall: Option<bool>,
}

impl PostureReport {
    pub fn parse(payload: &Payload) -> Self {
        let activity = payload
            .first_text(&["activity", "posture"])
            .and_then(|label| {
                let parsed = Activity::parse(&label);
                if parsed.is_none() {
                    warn!("Ignoring unrecognised activity '{label}'");
                }
                parsed
            });

        Self {
            device_id: payload.text("device_id"),
            activity,
            fall: payload.first_flag(&["fall", "fall_detected"]),
        }
    }
}
