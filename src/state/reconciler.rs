//! Alert state machine.
//!
//! One-shot detections (authorization, intrusion, abnormal vitals) always
//! overwrite `alert`. Toggled conditions (manual emergency, fall) set it when
//! raised and only clear it when the current alert is their own, so one
//! producer's all-clear never erases another producer's alert. Only one alert
//! is represented at a time: the most recently processed trigger wins.

use log::{info, warn};

use crate::models::{AccessStatus, Alert, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Authorized,
    IntruderDetected { image: Option<String> },
    /// High risk classification of a complete vitals reading.
    AbnormalVitals,
    /// Alarm raised on the device itself, without a classification.
    VitalsAlarm,
    ManualEmergency(bool),
    Fall(bool),
}

impl Event {
    /// Maps a producer-supplied event name. Unknown names yield `None`.
    pub fn from_name(name: &str, image: Option<String>) -> Option<Self> {
        let event = match name.trim().to_ascii_lowercase().as_str() {
            "authorized" | "authorised" | "authorized_access" => Event::Authorized,
            "intruder" | "intruder_detected" | "unauthorized" => {
                Event::IntruderDetected { image }
            }
            "abnormal_vitals" => Event::AbnormalVitals,
            "vitals_alert" | "vitals_alarm" => Event::VitalsAlarm,
            "manual_emergency" | "emergency" | "sos" => Event::ManualEmergency(true),
            "manual_emergency_cleared" | "emergency_cleared" | "sos_cleared" => {
                Event::ManualEmergency(false)
            }
            "fall" | "fall_detected" => Event::Fall(true),
            "fall_cleared" | "fall_recovered" => Event::Fall(false),
            _ => return None,
        };
        Some(event)
    }
}

/// Alert value before and after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: Alert,
    pub current: Alert,
}

impl Transition {
    pub fn unchanged(alert: Alert) -> Self {
        Self {
            previous: alert,
            current: alert,
        }
    }

    /// The alert that became active through this transition, if any.
    pub fn raised(&self) -> Option<Alert> {
        (self.current != self.previous && self.current.is_active()).then_some(self.current)
    }
}

pub fn reconcile(snapshot: &mut Snapshot, event: &Event) -> Transition {
    let previous = snapshot.alert;

    match event {
        Event::Authorized => {
            snapshot.access_status = AccessStatus::Authorized;
            // Clears every alert, including unrelated medical ones.
            snapshot.alert = Alert::None;
        }
        Event::IntruderDetected { image } => {
            snapshot.access_status = AccessStatus::IntruderDetected;
            snapshot.alert = Alert::SecurityAlert;
            if let Some(image) = image {
                snapshot.intruder_image = Some(image.clone());
            }
        }
        Event::AbnormalVitals => {
            snapshot.alert = Alert::MedicalEmergency;
        }
        Event::VitalsAlarm => {
            snapshot.alert = Alert::VitalsAlert;
        }
        Event::ManualEmergency(active) => {
            snapshot.manual_emergency = *active;
            toggle(&mut snapshot.alert, Alert::ManualEmergency, *active);
        }
        Event::Fall(active) => {
            snapshot.fall_detected = *active;
            toggle(&mut snapshot.alert, Alert::FallDetected, *active);
        }
    }

    let transition = Transition {
        previous,
        current: snapshot.alert,
    };
    if transition.current != transition.previous {
        info!(
            "Alert {} -> {} after {:?}",
            previous.as_str(),
            transition.current.as_str(),
            event
        );
    }
    transition
}

fn toggle(alert: &mut Alert, owned: Alert, active: bool) {
    if active {
        *alert = owned;
    } else if *alert == owned {
        *alert = Alert::None;
    }
}

/// Logs and drops an event name nothing understands.
pub fn reject_unknown(name: &str) {
    warn!("Unknown event '{name}'; snapshot unchanged");
}
