pub mod clock;
pub mod dispatcher;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{AlertDispatcher, DispatchPolicy};
pub use transport::{LogTransport, Transport};

#[cfg(test)]
pub(crate) mod testing;
