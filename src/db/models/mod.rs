pub mod history;
pub mod patient;

pub use history::{EnvironmentEntry, NewEnvironmentEntry, NewVitalsEntry, VitalsEntry};
pub use patient::Patient;
