//! Face-recognition camera at the entrance.

use log::warn;

use crate::models::AccessStatus;
use crate::vitals::Payload;

const IMAGE_KEYS: &[&str] = &["image", "image_path", "capture", "snapshot"];

#[derive(Debug, Clone, PartialEq)]
pub struct FaceReport {
    pub status: AccessStatus,
    /// Recognised person, when the camera names one.
    pub name: Option<String>,
    pub image: Option<String>,
}

impl FaceReport {
    /// Returns `None` when the payload carries no usable recognition result.
    pub fn parse(payload: &Payload) -> Option<Self> {
        let Some(label) = payload.first_text(&["event", "status", "result"]) else {
            warn!("Face report without a recognition result");
            return None;
        };

        let status = match label.to_ascii_lowercase().as_str() {
            "authorized" | "authorised" | "recognized" | "known" => AccessStatus::Authorized,
            "intruder" | "unknown" | "unauthorized" => AccessStatus::IntruderDetected,
            _ => {
                warn!("Ignoring unrecognised face result '{label}'");
                return None;
            }
        };

        Some(Self {
            status,
            name: payload.text("name"),
            image: payload.first_text(IMAGE_KEYS),
        })
    }
}
