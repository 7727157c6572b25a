use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Alias lists are matched case-insensitively, first entry has highest priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalAliases {
    pub heart_rate: Vec<String>,
    pub spo2: Vec<String>,
    pub temperature: Vec<String>,
}

impl Default for VitalAliases {
    fn default() -> Self {
        fn owned(aliases: &[&str]) -> Vec<String> {
            aliases.iter().map(|alias| alias.to_string()).collect()
        }

        Self {
            heart_rate: owned(&["heart_rate", "heartrate", "hr", "pulse", "bpm"]),
            spo2: owned(&["spo2", "sp_o2", "oxygen", "oxygen_saturation", "o2"]),
            temperature: owned(&[
                "temperature",
                "body_temperature",
                "body_temp",
                "temp",
            ]),
        }
    }
}

/// Values substituted for demographic fields a device did not send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicDefaults {
    pub weight_kg: f64,
    pub height_m: f64,
    pub smoking: bool,
    pub hypertension: bool,
}

impl Default for DemographicDefaults {
    fn default() -> Self {
        Self {
            weight_kg: 70.0,
            height_m: 1.75,
            smoking: false,
            hypertension: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub cooldown_secs: u64,
    /// Maximum advice characters carried in one notification.
    pub advice_char_budget: usize,
    pub truncation_marker: String,
    pub fallback_advice: String,
    pub sender: String,
    pub recipient: String,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            advice_char_budget: 900,
            truncation_marker: "... (truncated)".into(),
            fallback_advice: "Automated guidance is unavailable. Check on the patient and \
                              contact the on-call clinician if symptoms persist."
                .into(),
            sender: "healthguard".into(),
            recipient: "on-call".into(),
        }
    }
}

impl AlertSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub patient_placeholder_name: String,
    pub aliases: VitalAliases,
    pub demographics: DemographicDefaults,
    pub alerts: AlertSettings,
    pub history_limit: usize,
    pub database_path: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            patient_placeholder_name: "Unknown Patient".into(),
            aliases: VitalAliases::default(),
            demographics: DemographicDefaults::default(),
            alerts: AlertSettings::default(),
            history_limit: 50,
            database_path: Some(PathBuf::from("healthguard.sqlite3")),
        }
    }
}

impl MonitorSettings {
    /// Reads settings from `path`. A missing file yields defaults; an
    /// unparsable one is reported and replaced by defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(
                "Ignoring invalid settings file {}: {err}; using defaults",
                path.display()
            );
            Self::default()
        }))
    }

    /// Loads from `HEALTHGUARD_CONFIG` (default `healthguard.json`) and applies
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("HEALTHGUARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("healthguard.json"));

        let mut settings = Self::load(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("HEALTHGUARD_DB") {
            self.database_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Some(raw) = lookup("HEALTHGUARD_COOLDOWN_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.alerts.cooldown_secs = secs,
                Err(_) => warn!(
                    "HEALTHGUARD_COOLDOWN_SECS={raw} is not a number; keeping {}",
                    self.alerts.cooldown_secs
                ),
            }
        }

        if let Some(sender) = lookup("HEALTHGUARD_ALERT_FROM") {
            self.alerts.sender = sender;
        }
        if let Some(recipient) = lookup("HEALTHGUARD_ALERT_TO") {
            self.alerts.recipient = recipient;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_policy() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.alerts.cooldown(), Duration::from_secs(30));
        assert_eq!(settings.demographics.weight_kg, 70.0);
        assert_eq!(settings.demographics.height_m, 1.75);
        assert_eq!(settings.history_limit, 50);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let settings: MonitorSettings =
            serde_json::from_str(r#"{"alerts": {"cooldown_secs": 5}}"#).unwrap();
        assert_eq!(settings.alerts.cooldown_secs, 5);
        assert_eq!(settings.alerts.advice_char_budget, 900);
        assert_eq!(settings.aliases.heart_rate[0], "heart_rate");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = MonitorSettings::load(Path::new("/nonexistent/healthguard.json")).unwrap();
        assert_eq!(settings.patient_placeholder_name, "Unknown Patient");
    }

    #[test]
    fn environment_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("HEALTHGUARD_COOLDOWN_SECS", "12"),
            ("HEALTHGUARD_ALERT_TO", "whatsapp:+15550100"),
            ("HEALTHGUARD_DB", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = MonitorSettings::default();
        settings.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(settings.alerts.cooldown_secs, 12);
        assert_eq!(settings.alerts.recipient, "whatsapp:+15550100");
        assert!(settings.database_path.is_none());
    }

    #[test]
    fn unparsable_cooldown_is_ignored() {
        let mut settings = MonitorSettings::default();
        settings.apply_overrides(|key| {
            (key == "HEALTHGUARD_COOLDOWN_SECS").then(|| "soon".to_string())
        });
        assert_eq!(settings.alerts.cooldown_secs, 30);
    }
}
