//! Bedside ESP32 telemetry: vitals, demographics, room environment and the
//! device's own alarm buttons in one flat JSON object.

use crate::models::{EnvironmentUpdate, ProfileUpdate, Vitals, VitalsRecord};
use crate::vitals::{Payload, VitalNormalizer};

const NAME_KEYS: &[&str] = &["name", "patient_name", "patient"];
const GENDER_KEYS: &[&str] = &["gender", "sex"];
const HUMIDITY_KEYS: &[&str] = &["humidity", "room_humidity"];
const ROOM_TEMP_KEYS: &[&str] = &["room_temp", "room_temperature", "ambient_temp"];
const AQI_KEYS: &[&str] = &["aqi", "air_quality"];
const WEIGHT_KEYS: &[&str] = &["weight", "weight_kg"];
const HEIGHT_KEYS: &[&str] = &["height", "height_m"];
const MANUAL_KEYS: &[&str] = &["manual_emergency", "emergency", "sos"];
const FALL_KEYS: &[&str] = &["fall", "fall_detected"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Esp32Reading {
    pub device_id: Option<String>,
    pub vitals: Vitals,
    pub profile: ProfileUpdate,
    pub environment: EnvironmentUpdate,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub manual_emergency: Option<bool>,
    pub fall: Option<bool>,
}

impl Esp32Reading {
    pub fn parse(payload: &Payload, normalizer: &VitalNormalizer) -> Self {
        let profile = ProfileUpdate {
            name: payload.first_text(NAME_KEYS),
            age: payload
                .number("age")
                .filter(|age| *age <= f64::from(u16::MAX))
                .map(|age| age.round() as u32),
            gender: payload.first_text(GENDER_KEYS),
            smoking: payload.first_flag(&["smoking", "smoker"]),
            hypertension: payload.flag("hypertension"),
        };

        Self {
            device_id: payload.text("device_id"),
            vitals: normalizer.normalize(payload),
            profile,
            environment: EnvironmentUpdate {
                humidity: payload.first_number(HUMIDITY_KEYS),
                room_temp: payload.first_number(ROOM_TEMP_KEYS),
                aqi: payload.first_number(AQI_KEYS),
            },
            weight: payload.first_number(WEIGHT_KEYS),
            height: payload.first_number(HEIGHT_KEYS),
            manual_emergency: payload.first_flag(MANUAL_KEYS),
            fall: payload.first_flag(FALL_KEYS),
        }
    }

    /// Record for the risk pipeline, built from this reading alone. Fields it
    /// lacks stay absent; the classifier input fills the optional ones from
    /// configured defaults, never from an earlier reading.
    pub fn record(&self) -> VitalsRecord {
        VitalsRecord {
            heart_rate: self.vitals.heart_rate,
            spo2: self.vitals.spo2,
            temperature: self.vitals.temperature,
            age: self.profile.age.map(f64::from),
            gender: self.profile.gender.clone(),
            weight: self.weight,
            height: self.height,
            smoking: self.profile.smoking,
            hypertension: self.profile.hypertension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DemographicDefaults;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Esp32Reading {
        Esp32Reading::parse(&Payload::from_value(&value), &VitalNormalizer::default())
    }

    #[test]
    fn full_device_payload_is_split_into_groups() {
        let reading = parse(json!({
            "name": "Ravi",
            "age": 70,
            "gender": "Male",
            "heart_rate": 130,
            "spo2": 89,
            "temperature": 39.2,
            "smoking": true,
            "hypertension": 1,
            "weight": 82.5,
            "height": 1.7,
            "humidity": 55,
            "room_temp": 24.5,
            "aqi": 42,
            "device_id": "esp32-ward-7"
        }));

        assert_eq!(reading.device_id.as_deref(), Some("esp32-ward-7"));
        assert_eq!(reading.vitals.heart_rate, Some(130.0));
        assert_eq!(reading.profile.name.as_deref(), Some("Ravi"));
        assert_eq!(reading.profile.age, Some(70));
        assert_eq!(reading.profile.smoking, Some(true));
        assert_eq!(reading.profile.hypertension, Some(true));
        assert_eq!(reading.environment.room_temp, Some(24.5));
        assert_eq!(reading.weight, Some(82.5));
        assert!(reading.manual_emergency.is_none());
    }

    #[test]
    fn aliased_and_string_encoded_fields_are_accepted() {
        let reading = parse(json!({
            "HR": "88",
            "SpO2": "97",
            "Body_Temp": "36.9",
            "SOS": "yes",
            "Room_Temperature": 22
        }));

        assert_eq!(reading.vitals.heart_rate, Some(88.0));
        assert_eq!(reading.vitals.spo2, Some(97.0));
        assert_eq!(reading.vitals.temperature, Some(36.9));
        assert_eq!(reading.manual_emergency, Some(true));
        assert_eq!(reading.environment.room_temp, Some(22.0));
    }

    #[test]
    fn record_uses_only_this_readings_demographics() {
        let reading = parse(json!({
            "name": "Alice",
            "heart_rate": 85,
            "spo2": 97,
            "temperature": 37
        }));

        let record = reading.record();

        assert_eq!(record.heart_rate, Some(85.0));
        assert!(record.age.is_none());
        assert!(record.gender.is_none());
        assert!(record.smoking.is_none());
        assert!(record.hypertension.is_none());
        assert!(record.classifier_input(&DemographicDefaults::default()).is_none());
    }

    #[test]
    fn missing_vitals_are_not_filled_from_anywhere() {
        let reading = parse(json!({"age": 50, "humidity": 40}));
        let record = reading.record();
        assert!(record.heart_rate.is_none());
        assert!(reading.vitals.is_empty());
    }
}
