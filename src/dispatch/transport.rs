use anyhow::Result;
use log::info;
use uuid::Uuid;

/// Outbound notification channel (paging, messaging gateway, ...).
///
/// Implementations may block on the network; they are only ever called from
/// the dispatcher's own worker thread.
pub trait Transport: Send + 'static {
    /// Returns a delivery receipt on confirmed transmission.
    fn send(&mut self, body: &str, from: &str, to: &str) -> Result<String>;
}

/// Writes notifications to the log instead of a remote gateway.
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&mut self, body: &str, from: &str, to: &str) -> Result<String> {
        let receipt = Uuid::new_v4().to_string();
        info!("Notification {receipt} from {from} to {to}:\n{body}");
        Ok(receipt)
    }
}
