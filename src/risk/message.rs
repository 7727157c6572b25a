//! Notification bodies. The messaging gateway caps message size, so advice
//! text is cut to a character budget.

use crate::models::{Alert, ClassifierInput, Profile, RiskResult, Snapshot};
use crate::settings::AlertSettings;

/// Cuts `text` to `budget` characters and appends `marker` when anything was
/// dropped. Counts characters, not bytes.
pub fn truncate_advice(text: &str, budget: usize, marker: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(budget).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(marker);
    truncated
}

pub fn render_risk_message(
    profile: &Profile,
    input: &ClassifierInput,
    result: &RiskResult,
    advice: &str,
    settings: &AlertSettings,
) -> String {
    format!(
        "HEALTHGUARD ALERT: {risk} risk ({probability:.0}%)\n\
         Patient: {identity}\n\
         Heart rate: {hr:.0} bpm\n\
         SpO2: {spo2:.1}%\n\
         Temperature: {temp:.1} °C\n\
         \n\
         {advice}",
        risk = result.risk.as_str(),
        probability = result.probability * 100.0,
        identity = identity(profile, Some(input.age)),
        hr = input.heart_rate,
        spo2 = input.spo2,
        temp = input.temperature,
        advice = truncate_advice(
            advice,
            settings.advice_char_budget,
            &settings.truncation_marker
        ),
    )
}

/// Message for alerts raised directly by a trigger rather than by a risk
/// classification.
pub fn render_trigger_message(alert: Alert, snapshot: &Snapshot) -> String {
    let headline = match alert {
        Alert::FallDetected => "A fall was detected.",
        Alert::ManualEmergency => "The emergency button was pressed.",
        Alert::SecurityAlert => "An unrecognised person was detected at the entrance.",
        Alert::VitalsAlert => "The bedside device reported abnormal vitals.",
        Alert::MedicalEmergency => "Vitals were classified as high risk.",
        Alert::None => "Status update.",
    };

    let mut body = format!(
        "HEALTHGUARD ALERT: {}\n{}\nPatient: {}",
        alert.as_str(),
        headline,
        identity(&snapshot.profile, snapshot.profile.age.map(f64::from)),
    );

    let vitals = &snapshot.vitals;
    if let (Some(hr), Some(spo2), Some(temp)) = (vitals.heart_rate, vitals.spo2, vitals.temperature)
    {
        body.push_str(&format!(
            "\nLast vitals: {hr:.0} bpm, SpO2 {spo2:.1}%, {temp:.1} °C"
        ));
    }
    if alert == Alert::SecurityAlert {
        if let Some(image) = &snapshot.intruder_image {
            body.push_str(&format!("\nCapture: {image}"));
        }
    }
    body
}

fn identity(profile: &Profile, age: Option<f64>) -> String {
    let mut parts = vec![profile.name.clone()];
    if let Some(age) = age {
        parts.push(format!("{age:.0} y"));
    }
    if let Some(gender) = &profile.gender {
        parts.push(gender.clone());
    }
    parts.join(", ")
}
