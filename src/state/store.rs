use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use log::debug;

use crate::models::{
    AccessStatus, Activity, EnvironmentUpdate, ProfileUpdate, RiskResult, Snapshot, VitalsUpdate,
};

use super::reconciler::{reconcile, Event, Transition};

/// Owner of the live snapshot.
///
/// Every mutator takes the write lock once, applies its whole field group and
/// releases it, so readers never observe a half-applied update. No mutator
/// performs I/O while holding the lock.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl StateStore {
    pub fn new(placeholder_name: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot::new(placeholder_name))),
        }
    }

    pub fn get_snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    pub fn update_vitals(&self, update: VitalsUpdate) {
        if update.is_empty() {
            return;
        }
        self.mutate(|snapshot| {
            let vitals = &mut snapshot.vitals;
            if let Some(heart_rate) = update.heart_rate {
                vitals.heart_rate = Some(heart_rate);
            }
            if let Some(spo2) = update.spo2 {
                vitals.spo2 = Some(spo2);
            }
            if let Some(temperature) = update.temperature {
                vitals.temperature = Some(temperature);
            }
        });
    }

    pub fn update_profile(&self, update: ProfileUpdate) {
        if update.is_empty() {
            return;
        }
        self.mutate(|snapshot| {
            let profile = &mut snapshot.profile;
            if let Some(name) = update.name {
                profile.name = name;
            }
            if let Some(age) = update.age {
                profile.age = Some(age);
            }
            if let Some(gender) = update.gender {
                profile.gender = Some(gender);
            }
            if let Some(smoking) = update.smoking {
                profile.smoking = smoking;
            }
            if let Some(hypertension) = update.hypertension {
                profile.hypertension = hypertension;
            }
        });
    }

    pub fn update_activity(&self, activity: Activity) {
        self.mutate(|snapshot| snapshot.activity = activity);
    }

    pub fn update_environment(&self, update: EnvironmentUpdate) {
        if update.is_empty() {
            return;
        }
        self.mutate(|snapshot| {
            let environment = &mut snapshot.environment;
            if let Some(humidity) = update.humidity {
                environment.humidity = Some(humidity);
            }
            if let Some(room_temp) = update.room_temp {
                environment.room_temp = Some(room_temp);
            }
            if let Some(aqi) = update.aqi {
                environment.aqi = Some(aqi);
            }
        });
    }

    pub fn set_access(&self, status: AccessStatus, image: Option<String>) -> Transition {
        match status {
            AccessStatus::Authorized => self.apply_event(&Event::Authorized),
            AccessStatus::IntruderDetected => {
                self.apply_event(&Event::IntruderDetected { image })
            }
            AccessStatus::NoActivity => self.mutate(|snapshot| {
                snapshot.access_status = AccessStatus::NoActivity;
                Transition::unchanged(snapshot.alert)
            }),
        }
    }

    pub fn set_manual_emergency(&self, active: bool) -> Transition {
        self.apply_event(&Event::ManualEmergency(active))
    }

    pub fn set_fall(&self, active: bool) -> Transition {
        self.apply_event(&Event::Fall(active))
    }

    pub fn set_risk(&self, result: RiskResult) {
        self.mutate(|snapshot| snapshot.risk = Some(result));
    }

    /// Runs the alert state machine under the snapshot lock.
    pub fn apply_event(&self, event: &Event) -> Transition {
        self.mutate(|snapshot| reconcile(snapshot, event))
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut Snapshot) -> T) -> T {
        let mut guard = self.write();
        let result = apply(&mut *guard);
        guard.updated_at = Utc::now();
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                debug!("Recovering poisoned snapshot lock for read");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                debug!("Recovering poisoned snapshot lock for write");
                poisoned.into_inner()
            }
        }
    }
}
