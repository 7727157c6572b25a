use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::{
    dispatch::AlertDispatcher,
    models::{ClassifierInput, RiskResult, VitalsRecord},
    settings::{AlertSettings, DemographicDefaults, MonitorSettings},
    state::{Event, StateStore},
};

use super::collaborators::{validate_prediction, AdviceGenerator, AdviceRequest, RiskClassifier};
use super::message::render_risk_message;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOutcome {
    pub result: RiskResult,
    /// Whether a notification was actually transmitted.
    pub notified: bool,
}

/// Classifies complete readings and escalates high risk.
///
/// The classifier and advice generator run on the blocking pool against a
/// copied feature vector; the snapshot lock is never held while they run.
#[derive(Clone)]
pub struct RiskPipeline {
    store: StateStore,
    dispatcher: AlertDispatcher,
    classifier: Arc<dyn RiskClassifier>,
    advisor: Arc<dyn AdviceGenerator>,
    demographics: DemographicDefaults,
    alerts: AlertSettings,
}

impl RiskPipeline {
    pub fn new(
        store: StateStore,
        dispatcher: AlertDispatcher,
        classifier: Arc<dyn RiskClassifier>,
        advisor: Arc<dyn AdviceGenerator>,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            store,
            dispatcher,
            classifier,
            advisor,
            demographics: settings.demographics.clone(),
            alerts: settings.alerts.clone(),
        }
    }

    /// Returns `Ok(None)` without calling the classifier when the record lacks
    /// a mandatory field. A classifier failure is returned as an error and
    /// leaves the snapshot's risk untouched.
    pub async fn evaluate(&self, record: &VitalsRecord) -> Result<Option<PipelineOutcome>> {
        let Some(input) = record.classifier_input(&self.demographics) else {
            debug!("Skipping risk evaluation; reading is incomplete");
            return Ok(None);
        };

        let classifier = Arc::clone(&self.classifier);
        let prediction = tokio::task::spawn_blocking(move || classifier.predict(&input))
            .await
            .context("classifier worker join failed")?
            .context("risk classification failed")?;
        let result = validate_prediction(prediction)?;

        info!(
            "Risk classified as {} (p={:.3}) for hr={} spo2={} temp={}",
            result.risk.as_str(),
            result.probability,
            input.heart_rate,
            input.spo2,
            input.temperature
        );
        self.store.set_risk(result);

        if !result.is_high() {
            return Ok(Some(PipelineOutcome {
                result,
                notified: false,
            }));
        }

        self.store.apply_event(&Event::AbnormalVitals);

        let advice = self.advice(&input, result).await;
        let profile = self.store.get_snapshot().profile;
        let message = render_risk_message(&profile, &input, &result, &advice, &self.alerts);
        let notified = self.dispatcher.send(message).await;

        Ok(Some(PipelineOutcome { result, notified }))
    }

    async fn advice(&self, input: &ClassifierInput, risk: RiskResult) -> String {
        let advisor = Arc::clone(&self.advisor);
        let request = AdviceRequest {
            age: input.age,
            heart_rate: input.heart_rate,
            spo2: input.spo2,
            temperature: input.temperature,
            risk,
        };

        match tokio::task::spawn_blocking(move || advisor.advise(&request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("Advice generator returned nothing; using fallback advice");
                self.alerts.fallback_advice.clone()
            }
            Ok(Err(err)) => {
                warn!("Advice generation failed: {err:#}; using fallback advice");
                self.alerts.fallback_advice.clone()
            }
            Err(err) => {
                error!("Advice worker join failed: {err}");
                self.alerts.fallback_advice.clone()
            }
        }
    }
}
