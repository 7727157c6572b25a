pub mod esp32;
pub mod events;
pub mod face;
pub mod posture;

pub use esp32::Esp32Reading;
pub use events::parse_event;
pub use face::FaceReport;
pub use posture::PostureReport;
