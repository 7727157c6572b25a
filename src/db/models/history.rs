//! Rows of the vitals and environment logs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Environment, RiskLevel, RiskResult, Vitals};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalsEntry {
    pub id: i64,
    pub patient_id: String,
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub temperature: Option<f64>,
    pub weight: Option<f64>,
    pub risk: RiskLevel,
    pub probability: f64,
    pub device_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVitalsEntry {
    pub patient_id: String,
    pub vitals: Vitals,
    pub weight: Option<f64>,
    /// `None` when the reading was not classified; stored as `Monitoring`.
    pub risk: Option<RiskResult>,
    pub device_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentEntry {
    pub id: i64,
    pub humidity: Option<f64>,
    pub room_temp: Option<f64>,
    pub aqi: Option<f64>,
    pub device_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEnvironmentEntry {
    pub environment: Environment,
    pub device_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
