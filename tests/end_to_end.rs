use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use serde_json::json;

use healthguard_lib::{
    db::{Database, VitalsEntry},
    dispatch::{AlertDispatcher, DispatchPolicy, ManualClock, Transport},
    models::{AccessStatus, Activity, Alert, ClassifierInput, RiskLevel, RiskResult},
    risk::{GuidelineAdvisor, RiskClassifier, ScoringClassifier},
    settings::MonitorSettings,
    Monitor,
};

#[derive(Clone, Default)]
struct Outbox {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Outbox {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Transport for Outbox {
    fn send(&mut self, body: &str, _from: &str, _to: &str) -> Result<String> {
        self.messages.lock().unwrap().push(body.to_string());
        Ok("queued".into())
    }
}

struct UnreachableModel;

impl RiskClassifier for UnreachableModel {
    fn predict(&self, _input: &ClassifierInput) -> Result<RiskResult> {
        Err(anyhow!("model server unreachable"))
    }
}

#[derive(Default)]
struct CountingModel {
    calls: AtomicUsize,
    inner: ScoringClassifier,
}

impl RiskClassifier for CountingModel {
    fn predict(&self, input: &ClassifierInput) -> Result<RiskResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.predict(input)
    }
}

struct Rig {
    monitor: Monitor,
    outbox: Outbox,
    clock: ManualClock,
}

fn rig_with(classifier: Arc<dyn RiskClassifier>, history: Option<Database>) -> Rig {
    let settings = MonitorSettings::default();
    let outbox = Outbox::default();
    let clock = ManualClock::new();
    let dispatcher = AlertDispatcher::new(
        outbox.clone(),
        clock.clone(),
        DispatchPolicy::from(&settings.alerts),
    )
    .unwrap();

    Rig {
        monitor: Monitor::new(
            &settings,
            dispatcher,
            classifier,
            Arc::new(GuidelineAdvisor),
            history,
        ),
        outbox,
        clock,
    }
}

fn rig() -> Rig {
    rig_with(Arc::new(ScoringClassifier::default()), None)
}

fn critical_reading() -> serde_json::Value {
    json!({
        "name": "Ravi",
        "age": 70,
        "gender": "Male",
        "heart_rate": 130,
        "spo2": 89,
        "temperature": 39.2,
        "smoking": true,
        "hypertension": true,
        "device_id": "esp32-ward-7"
    })
}

#[tokio::test]
async fn critical_reading_raises_medical_emergency_once() {
    let rig = rig();

    let outcome = rig.monitor.ingest_esp32(&critical_reading()).await;

    assert!(outcome.accepted);
    assert!(outcome.notified);
    assert_eq!(outcome.risk.map(|r| r.risk), Some(RiskLevel::High));
    assert_eq!(outcome.snapshot.alert, Alert::MedicalEmergency);
    assert_eq!(outcome.snapshot.profile.name, "Ravi");

    let messages = rig.outbox.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Ravi, 70 y, Male"));

    // Same reading again inside the cooldown window: state updates, no message.
    let repeat = rig.monitor.ingest_esp32(&critical_reading()).await;
    assert!(!repeat.notified);
    assert_eq!(rig.outbox.messages().len(), 1);
}

#[tokio::test]
async fn partial_readings_keep_previous_values() {
    let rig = rig();

    rig.monitor
        .ingest_esp32(&json!({"heart_rate": 72, "spo2": 98, "temperature": 36.7}))
        .await;
    let outcome = rig.monitor.ingest_esp32(&json!({"pulse": 80})).await;

    let vitals = outcome.snapshot.vitals;
    assert_eq!(vitals.heart_rate, Some(80.0));
    assert_eq!(vitals.spo2, Some(98.0));
    assert_eq!(vitals.temperature, Some(36.7));
    // No age anywhere: nothing was classified.
    assert!(outcome.risk.is_none());
    assert!(outcome.snapshot.risk.is_none());
}

#[tokio::test]
async fn reading_without_age_is_not_classified_with_earlier_demographics() {
    let model = Arc::new(CountingModel::default());
    let rig = rig_with(model.clone(), None);

    let john = rig
        .monitor
        .ingest_esp32(&json!({
            "name": "John",
            "age": 45,
            "gender": "Male",
            "heart_rate": 72,
            "spo2": 98,
            "temperature": 36.8
        }))
        .await;
    assert!(john.risk.is_some());
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);

    let alice = rig
        .monitor
        .ingest_esp32(&json!({"name": "Alice", "heart_rate": 85, "spo2": 97, "temperature": 37}))
        .await;

    assert!(alice.accepted);
    assert!(alice.risk.is_none());
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(alice.snapshot.profile.name, "Alice");
    assert_eq!(alice.snapshot.vitals.heart_rate, Some(85.0));
}

#[tokio::test]
async fn classifier_outage_still_acknowledges_reading() {
    let rig = rig_with(Arc::new(UnreachableModel), None);

    let outcome = rig.monitor.ingest_esp32(&critical_reading()).await;

    assert!(outcome.accepted);
    assert!(outcome.risk.is_none());
    assert_eq!(outcome.snapshot.vitals.heart_rate, Some(130.0));
    assert_eq!(outcome.snapshot.alert, Alert::None);
    assert!(rig.outbox.messages().is_empty());
}

#[tokio::test]
async fn triggers_share_one_cooldown_window() {
    let rig = rig();

    let fall = rig.monitor.ingest_event(&json!({"event": "fall"})).await;
    assert!(fall.notified);
    assert_eq!(fall.snapshot.alert, Alert::FallDetected);

    rig.clock.advance(Duration::from_secs(5));
    let manual = rig
        .monitor
        .ingest_event(&json!({"event": "manual_emergency"}))
        .await;
    assert!(!manual.notified);
    assert_eq!(manual.snapshot.alert, Alert::ManualEmergency);

    let cleared = rig.monitor.ingest_event(&json!({"event": "fall_cleared"})).await;
    assert_eq!(cleared.snapshot.alert, Alert::ManualEmergency);
    assert!(!cleared.snapshot.fall_detected);

    rig.clock.advance(Duration::from_secs(26));
    let intruder = rig
        .monitor
        .ingest_face(&json!({"event": "intruder", "image": "captures/door-01.jpg"}))
        .await;
    assert!(intruder.notified);

    let messages = rig.outbox.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("FALL DETECTED"));
    assert!(messages[1].contains("captures/door-01.jpg"));
}

#[tokio::test]
async fn authorized_face_clears_intrusion() {
    let rig = rig();

    rig.monitor.ingest_face(&json!({"event": "intruder"})).await;
    let outcome = rig
        .monitor
        .ingest_face(&json!({"event": "authorized", "name": "nurse_kim"}))
        .await;

    assert_eq!(outcome.snapshot.alert, Alert::None);
    assert_eq!(outcome.snapshot.access_status, AccessStatus::Authorized);
}

#[tokio::test]
async fn posture_updates_activity_and_reports_falls() {
    let rig = rig();

    let sitting = rig
        .monitor
        .ingest_posture(&json!({"activity": "Sitting", "device_id": "camera-01"}))
        .await;
    assert_eq!(sitting.snapshot.activity, Activity::Sitting);

    let fallen = rig
        .monitor
        .ingest_posture(&json!({"activity": "lying", "fall": true}))
        .await;
    assert!(fallen.notified);
    assert_eq!(fallen.snapshot.activity, Activity::Sleeping);
    assert_eq!(fallen.snapshot.alert, Alert::FallDetected);

    let bogus = rig.monitor.ingest_posture(&json!({"activity": "flying"})).await;
    assert!(!bogus.accepted);
    assert_eq!(bogus.snapshot.activity, Activity::Sleeping);
}

#[tokio::test]
async fn unknown_event_leaves_snapshot_untouched() {
    let rig = rig();
    let before = rig.monitor.snapshot();

    let outcome = rig.monitor.ingest_event(&json!({"event": "meteor"})).await;

    assert!(!outcome.accepted);
    assert_eq!(outcome.snapshot.alert, before.alert);
    assert_eq!(outcome.snapshot.updated_at, before.updated_at);
}

async fn wait_for_vitals(monitor: &Monitor, expected: usize) -> Vec<VitalsEntry> {
    let mut vitals = Vec::new();
    for _ in 0..100 {
        vitals = monitor.history_vitals(None).await.unwrap();
        if vitals.len() == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    vitals
}

#[tokio::test]
async fn readings_are_persisted_to_history() {
    let db = Database::in_memory().unwrap();
    let rig = rig_with(Arc::new(ScoringClassifier::default()), Some(db));

    rig.monitor
        .ingest_esp32(&json!({
            "name": "Asha",
            "age": 64,
            "heart_rate": 76,
            "spo2": 97,
            "temperature": 36.8,
            "humidity": 48,
            "aqi": 35
        }))
        .await;
    assert_eq!(wait_for_vitals(&rig.monitor, 1).await.len(), 1);

    rig.monitor
        .ingest_esp32(&json!({"name": "Asha", "heart_rate": 78}))
        .await;
    let vitals = wait_for_vitals(&rig.monitor, 2).await;

    assert_eq!(vitals.len(), 2);
    assert_eq!(vitals[0].risk, RiskLevel::Normal);
    assert_eq!(vitals[1].heart_rate, Some(78.0));
    assert_eq!(vitals[1].spo2, None);
    assert_eq!(vitals[1].risk, RiskLevel::Monitoring);

    let environment = rig.monitor.history_environment(Some(5)).await.unwrap();
    assert_eq!(environment.len(), 1);
    assert_eq!(environment[0].aqi, Some(35.0));
}
