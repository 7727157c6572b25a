use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored person, identified by name, age and gender as reported by the
/// bedside device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub smoking: bool,
    pub hypertension: bool,
    pub created_at: DateTime<Utc>,
}
