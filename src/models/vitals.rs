//! Per-reading records consumed by the risk pipeline.

use serde::Serialize;

use super::snapshot::RiskLevel;
use crate::settings::DemographicDefaults;

const FEVER_THRESHOLD_C: f64 = 37.5;
const LOW_SPO2_THRESHOLD: f64 = 94.0;

/// One reading as assembled by an ingestion adapter. Lives only for the call
/// that classifies it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VitalsRecord {
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub temperature: Option<f64>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub smoking: Option<bool>,
    pub hypertension: Option<bool>,
}

impl VitalsRecord {
    /// Builds the classifier features, or `None` while a mandatory field
    /// (heart rate, SpO2, temperature, age) is missing.
    pub fn classifier_input(&self, defaults: &DemographicDefaults) -> Option<ClassifierInput> {
        let heart_rate = self.heart_rate?;
        let spo2 = self.spo2?;
        let temperature = self.temperature?;
        let age = self.age?;

        let weight = self.weight.unwrap_or(defaults.weight_kg);
        let height = self
            .height
            .filter(|height| *height > 0.0)
            .unwrap_or(defaults.height_m);
        let gender_code = match self.gender.as_deref() {
            Some(gender) if gender.trim().eq_ignore_ascii_case("male") => 0,
            _ => 1,
        };

        Some(ClassifierInput {
            heart_rate,
            temperature,
            spo2,
            age,
            gender_code,
            weight,
            height,
            smoking: self.smoking.unwrap_or(defaults.smoking),
            hypertension: self.hypertension.unwrap_or(defaults.hypertension),
            bmi: weight / (height * height),
            fever: temperature > FEVER_THRESHOLD_C,
            low_spo2: spo2 < LOW_SPO2_THRESHOLD,
        })
    }
}

/// Fully populated feature vector handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierInput {
    pub heart_rate: f64,
    pub temperature: f64,
    pub spo2: f64,
    pub age: f64,
    /// 0 for male, 1 otherwise.
    pub gender_code: u8,
    pub weight: f64,
    pub height: f64,
    pub smoking: bool,
    pub hypertension: bool,
    pub bmi: f64,
    pub fever: bool,
    pub low_spo2: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskResult {
    pub risk: RiskLevel,
    pub probability: f64,
}

impl RiskResult {
    /// Placeholder attached to readings that were never classified.
    pub fn monitoring() -> Self {
        Self {
            risk: RiskLevel::Monitoring,
            probability: 0.0,
        }
    }

    pub fn is_high(&self) -> bool {
        self.risk == RiskLevel::High
    }
}
