//! Contracts for the external risk model and advice generator, plus rule-based
//! stand-ins used when no external service is wired in.

use anyhow::{bail, Result};

use crate::models::{ClassifierInput, RiskLevel, RiskResult};

/// Binary risk model. May block; the pipeline runs it off the async workers.
pub trait RiskClassifier: Send + Sync + 'static {
    fn predict(&self, input: &ClassifierInput) -> Result<RiskResult>;
}

/// Inputs for a short natural-language care note.
#[derive(Debug, Clone, PartialEq)]
pub struct AdviceRequest {
    pub age: f64,
    pub heart_rate: f64,
    pub spo2: f64,
    pub temperature: f64,
    pub risk: RiskResult,
}

pub trait AdviceGenerator: Send + Sync + 'static {
    fn advise(&self, request: &AdviceRequest) -> Result<String>;
}

/// Rejects results a model should never produce.
pub fn validate_prediction(result: RiskResult) -> Result<RiskResult> {
    if result.risk == RiskLevel::Monitoring {
        bail!("classifier returned a non-decision label");
    }
    if !result.probability.is_finite() {
        bail!("classifier returned non-finite probability {}", result.probability);
    }
    Ok(RiskResult {
        risk: result.risk,
        probability: result.probability.clamp(0.0, 1.0),
    })
}

/// Additive clinical risk score squashed through a logistic curve.
///
/// Weights follow the scoring used to label the training data of the
/// production model, so both agree on clear-cut cases.
pub struct ScoringClassifier {
    pub threshold: f64,
}

impl Default for ScoringClassifier {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl ScoringClassifier {
    pub fn score(input: &ClassifierInput) -> u32 {
        let mut score = 0;

        score += match input.heart_rate {
            hr if hr > 105.0 => 3,
            hr if hr > 95.0 => 2,
            hr if hr > 85.0 => 1,
            _ => 0,
        };
        score += match input.temperature {
            t if t > 38.0 => 2,
            t if t > 37.5 => 1,
            _ => 0,
        };
        score += match input.spo2 {
            s if s < 90.0 => 3,
            s if s < 94.0 => 2,
            _ => 0,
        };
        if input.age > 65.0 {
            score += 1;
        }
        if input.smoking {
            score += 1;
        }
        if input.hypertension {
            score += 2;
        }

        score
    }
}

impl RiskClassifier for ScoringClassifier {
    fn predict(&self, input: &ClassifierInput) -> Result<RiskResult> {
        let score = f64::from(Self::score(input));
        let probability = 1.0 / (1.0 + (-1.2 * (score - 3.0)).exp());
        let risk = if probability >= self.threshold {
            RiskLevel::High
        } else {
            RiskLevel::Normal
        };
        Ok(RiskResult { risk, probability })
    }
}

/// Template advice assembled from the vitals that are out of range.
pub struct GuidelineAdvisor;

impl AdviceGenerator for GuidelineAdvisor {
    fn advise(&self, request: &AdviceRequest) -> Result<String> {
        let mut lines = Vec::new();

        if request.spo2 < 94.0 {
            lines.push(format!(
                "- Oxygen saturation is low ({:.0}%). Sit the patient upright and recheck the sensor placement.",
                request.spo2
            ));
        }
        if request.temperature > 37.5 {
            lines.push(format!(
                "- Temperature is elevated ({:.1} °C). Keep the patient hydrated and monitor every 30 minutes.",
                request.temperature
            ));
        }
        if request.heart_rate > 100.0 {
            lines.push(format!(
                "- Heart rate is high ({:.0} bpm). Encourage rest and avoid exertion.",
                request.heart_rate
            ));
        } else if request.heart_rate < 50.0 {
            lines.push(format!(
                "- Heart rate is low ({:.0} bpm). Check responsiveness.",
                request.heart_rate
            ));
        }
        if request.risk.is_high() {
            lines.push("- Contact the attending clinician now.".to_string());
        } else {
            lines.push("- Continue routine monitoring.".to_string());
        }

        Ok(lines.join("\n"))
    }
}
