use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;

use crate::{
    db::{Database, EnvironmentEntry, NewEnvironmentEntry, NewVitalsEntry, VitalsEntry},
    dispatch::AlertDispatcher,
    ingest::{parse_event, Esp32Reading, FaceReport, PostureReport},
    models::{Environment, Profile, RiskResult, Snapshot, Vitals},
    risk::{message::render_trigger_message, AdviceGenerator, RiskClassifier, RiskPipeline},
    settings::MonitorSettings,
    state::{StateStore, Transition},
    vitals::{Payload, VitalNormalizer},
};

/// Acknowledgment returned to every producer. Downstream failures never turn
/// into an error here; they are only logged.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// `false` when the payload carried nothing the monitor could apply.
    pub accepted: bool,
    pub snapshot: Snapshot,
    pub risk: Option<RiskResult>,
    pub notified: bool,
}

/// One reading queued for the history store.
struct HistoryWrite {
    profile: Profile,
    vitals: Vitals,
    weight: Option<f64>,
    risk: Option<RiskResult>,
    environment: Environment,
    device_id: Option<String>,
}

/// Entry point for all producers: ingestion -> state -> alerts -> history.
#[derive(Clone)]
pub struct Monitor {
    store: StateStore,
    normalizer: VitalNormalizer,
    pipeline: RiskPipeline,
    dispatcher: AlertDispatcher,
    history: Option<Database>,
    history_limit: usize,
}

impl Monitor {
    pub fn new(
        settings: &MonitorSettings,
        dispatcher: AlertDispatcher,
        classifier: Arc<dyn RiskClassifier>,
        advisor: Arc<dyn AdviceGenerator>,
        history: Option<Database>,
    ) -> Self {
        let store = StateStore::new(&settings.patient_placeholder_name);
        let pipeline = RiskPipeline::new(
            store.clone(),
            dispatcher.clone(),
            classifier,
            advisor,
            settings,
        );

        Self {
            store,
            normalizer: VitalNormalizer::new(settings.aliases.clone()),
            pipeline,
            dispatcher,
            history,
            history_limit: settings.history_limit,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.get_snapshot()
    }

    /// Bedside device telemetry.
    pub async fn ingest_esp32(&self, body: &Value) -> IngestOutcome {
        let payload = Payload::from_value(body);
        if payload.is_empty() {
            return self.rejected();
        }
        let reading = Esp32Reading::parse(&payload, &self.normalizer);

        self.store.update_profile(reading.profile.clone());
        self.store.update_vitals(reading.vitals);
        self.store.update_environment(reading.environment);

        let mut notified = false;
        if let Some(active) = reading.manual_emergency {
            notified |= self.notify(self.store.set_manual_emergency(active)).await;
        }
        if let Some(active) = reading.fall {
            notified |= self.notify(self.store.set_fall(active)).await;
        }

        let risk = match self.pipeline.evaluate(&reading.record()).await {
            Ok(Some(outcome)) => {
                notified |= outcome.notified;
                Some(outcome.result)
            }
            Ok(None) => None,
            Err(err) => {
                error!("Risk evaluation failed: {err:#}");
                None
            }
        };

        self.persist(HistoryWrite {
            profile: self.store.get_snapshot().profile,
            vitals: reading.vitals,
            weight: reading.weight,
            risk,
            environment: reading.environment,
            device_id: reading.device_id,
        });

        self.accepted(risk, notified)
    }

    /// Posture camera.
    pub async fn ingest_posture(&self, body: &Value) -> IngestOutcome {
        let report = PostureReport::parse(&Payload::from_value(body));
        if report.activity.is_none() && report.fall.is_none() {
            return self.rejected();
        }

        if let Some(activity) = report.activity {
            debug!(
                "Activity {:?} from {}",
                activity,
                report.device_id.as_deref().unwrap_or("unknown camera")
            );
            self.store.update_activity(activity);
        }

        let mut notified = false;
        if let Some(active) = report.fall {
            notified = self.notify(self.store.set_fall(active)).await;
        }

        self.accepted(None, notified)
    }

    /// Face-recognition camera.
    pub async fn ingest_face(&self, body: &Value) -> IngestOutcome {
        let Some(report) = FaceReport::parse(&Payload::from_value(body)) else {
            return self.rejected();
        };

        if let Some(name) = &report.name {
            info!("Face camera reported {} for {name}", report.status.as_str());
        }
        let transition = self.store.set_access(report.status, report.image);
        let notified = self.notify(transition).await;

        self.accepted(None, notified)
    }

    /// Generic named event.
    pub async fn ingest_event(&self, body: &Value) -> IngestOutcome {
        let Some(event) = parse_event(&Payload::from_value(body)) else {
            return self.rejected();
        };

        let transition = self.store.apply_event(&event);
        let notified = self.notify(transition).await;

        self.accepted(None, notified)
    }

    /// Recent readings of the current patient, oldest first. Empty when no
    /// history store is configured or the patient has no rows yet.
    pub async fn history_vitals(&self, limit: Option<usize>) -> Result<Vec<VitalsEntry>> {
        let Some(db) = &self.history else {
            return Ok(Vec::new());
        };
        let profile = self.store.get_snapshot().profile;
        match db.find_patient(&profile).await? {
            Some(patient_id) => {
                db.query_recent_vitals(&patient_id, limit.unwrap_or(self.history_limit))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn history_environment(&self, limit: Option<usize>) -> Result<Vec<EnvironmentEntry>> {
        match &self.history {
            Some(db) => {
                db.query_recent_environment(limit.unwrap_or(self.history_limit))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Sends a trigger notification when `transition` raised a new alert.
    async fn notify(&self, transition: Transition) -> bool {
        let Some(alert) = transition.raised() else {
            return false;
        };
        let message = render_trigger_message(alert, &self.store.get_snapshot());
        self.dispatcher.send(message).await
    }

    fn persist(&self, write: HistoryWrite) {
        let Some(db) = self.history.clone() else {
            return;
        };
        if write.vitals.is_empty() && write.environment.is_empty() {
            return;
        }

        tokio::spawn(async move {
            if let Err(err) = record_history(&db, write).await {
                error!("Failed to persist reading: {err:#}");
            }
        });
    }

    fn accepted(&self, risk: Option<RiskResult>, notified: bool) -> IngestOutcome {
        IngestOutcome {
            accepted: true,
            snapshot: self.store.get_snapshot(),
            risk,
            notified,
        }
    }

    fn rejected(&self) -> IngestOutcome {
        IngestOutcome {
            accepted: false,
            snapshot: self.store.get_snapshot(),
            risk: None,
            notified: false,
        }
    }
}

async fn record_history(db: &Database, write: HistoryWrite) -> Result<()> {
    let recorded_at = Utc::now();

    if !write.vitals.is_empty() {
        let patient_id = db.get_or_create_patient(&write.profile).await?;
        db.append_vitals(NewVitalsEntry {
            patient_id,
            vitals: write.vitals,
            weight: write.weight,
            risk: write.risk,
            device_id: write.device_id.clone(),
            recorded_at,
        })
        .await?;
    }

    if !write.environment.is_empty() {
        db.append_environment(NewEnvironmentEntry {
            environment: write.environment,
            device_id: write.device_id,
            recorded_at,
        })
        .await?;
    }

    Ok(())
}
