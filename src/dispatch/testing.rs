//! Transport double shared by unit tests.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::transport::Transport;

#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
    failures_left: Arc<Mutex<u32>>,
}

impl RecordingTransport {
    /// Fails the first `times` deliveries.
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: Arc::new(Mutex::new(times)),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, body: &str, _from: &str, _to: &str) -> Result<String> {
        let mut failures = self.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(anyhow!("gateway unavailable"));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(body.to_string());
        Ok(format!("receipt-{}", sent.len()))
    }
}
