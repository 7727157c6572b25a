pub mod placeholder;
pub mod snapshot;
pub mod vitals;

pub use snapshot::{
    AccessStatus, Activity, Alert, Environment, EnvironmentUpdate, Profile, ProfileUpdate,
    RiskLevel, Snapshot, Vitals, VitalsUpdate,
};
pub use vitals::{ClassifierInput, RiskResult, VitalsRecord};
