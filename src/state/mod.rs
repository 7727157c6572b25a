pub mod reconciler;
pub mod store;

pub use reconciler::{Event, Transition};
pub use store::StateStore;
