//! The live monitoring snapshot and its field groups.
//!
//! One `Snapshot` exists per deployment. It is created with placeholder values
//! at startup and mutated field group by field group through the state store.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::placeholder::or_unknown;
use super::vitals::RiskResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessStatus {
    #[default]
    NoActivity,
    Authorized,
    IntruderDetected,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::NoActivity => "No activity",
            AccessStatus::Authorized => "Authorized access",
            AccessStatus::IntruderDetected => "Intruder detected",
        }
    }
}

impl Serialize for AccessStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The single alert value shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alert {
    #[default]
    None,
    SecurityAlert,
    MedicalEmergency,
    VitalsAlert,
    ManualEmergency,
    FallDetected,
}

impl Alert {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alert::None => "None",
            Alert::SecurityAlert => "SECURITY ALERT",
            Alert::MedicalEmergency => "MEDICAL EMERGENCY",
            Alert::VitalsAlert => "VITALS ALERT",
            Alert::ManualEmergency => "MANUAL EMERGENCY",
            Alert::FallDetected => "FALL DETECTED",
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Alert::None
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Activity {
    #[default]
    Unknown,
    Standing,
    Sitting,
    Sleeping,
}

impl Activity {
    /// Parses a posture label as reported by camera producers.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unknown" => Some(Activity::Unknown),
            "standing" | "stand" => Some(Activity::Standing),
            "sitting" | "sit" => Some(Activity::Sitting),
            "sleeping" | "sleep" | "lying" => Some(Activity::Sleeping),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Monitoring,
    Normal,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Monitoring => "Monitoring",
            RiskLevel::Normal => "Normal",
            RiskLevel::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Monitoring" => Some(RiskLevel::Monitoring),
            "Normal" => Some(RiskLevel::Normal),
            "High" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vitals {
    #[serde(serialize_with = "or_unknown")]
    pub heart_rate: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub spo2: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub temperature: Option<f64>,
}

/// Sparse vitals update; `None` leaves the stored value untouched.
pub type VitalsUpdate = Vitals;

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none() && self.spo2.is_none() && self.temperature.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub name: String,
    #[serde(serialize_with = "or_unknown")]
    pub age: Option<u32>,
    #[serde(serialize_with = "or_unknown")]
    pub gender: Option<String>,
    pub smoking: bool,
    pub hypertension: bool,
}

impl Profile {
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            age: None,
            gender: None,
            smoking: false,
            hypertension: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub smoking: Option<bool>,
    pub hypertension: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.smoking.is_none()
            && self.hypertension.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Environment {
    #[serde(serialize_with = "or_unknown")]
    pub humidity: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub room_temp: Option<f64>,
    #[serde(serialize_with = "or_unknown")]
    pub aqi: Option<f64>,
}

pub type EnvironmentUpdate = Environment;

impl Environment {
    pub fn is_empty(&self) -> bool {
        self.humidity.is_none() && self.room_temp.is_none() && self.aqi.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub access_status: AccessStatus,
    pub alert: Alert,
    pub vitals: Vitals,
    #[serde(serialize_with = "or_unknown")]
    pub risk: Option<RiskResult>,
    pub profile: Profile,
    pub activity: Activity,
    pub environment: Environment,
    #[serde(serialize_with = "or_unknown")]
    pub intruder_image: Option<String>,
    pub manual_emergency: bool,
    pub fall_detected: bool,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(placeholder_name: &str) -> Self {
        Self {
            access_status: AccessStatus::NoActivity,
            alert: Alert::None,
            vitals: Vitals::default(),
            risk: None,
            profile: Profile::placeholder(placeholder_name),
            activity: Activity::Unknown,
            environment: Environment::default(),
            intruder_image: None,
            manual_emergency: false,
            fall_detected: false,
            updated_at: Utc::now(),
        }
    }

    /// Conditions that are currently asserted, most urgent first.
    ///
    /// Derived from the independent trigger flags; it does not change how
    /// `alert` is decided.
    pub fn active_conditions(&self) -> Vec<Alert> {
        let mut active = Vec::new();
        if self.fall_detected {
            active.push(Alert::FallDetected);
        }
        if self.manual_emergency {
            active.push(Alert::ManualEmergency);
        }
        if matches!(self.risk, Some(result) if result.risk == RiskLevel::High) {
            active.push(Alert::MedicalEmergency);
        }
        if self.access_status == AccessStatus::IntruderDetected {
            active.push(Alert::SecurityAlert);
        }
        active
    }
}
