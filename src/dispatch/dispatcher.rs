use std::{
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::sync::oneshot;

use crate::settings::AlertSettings;

use super::clock::{Clock, SystemClock};
use super::transport::Transport;

enum DispatchCommand {
    Send {
        message: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

struct DispatcherInner {
    sender: mpsc::Sender<DispatchCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DispatcherInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DispatchCommand::Shutdown) {
                error!("Failed to send shutdown to dispatch thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join dispatch thread: {join_err:?}");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub cooldown: Duration,
    pub sender: String,
    pub recipient: String,
}

impl From<&AlertSettings> for DispatchPolicy {
    fn from(settings: &AlertSettings) -> Self {
        Self {
            cooldown: settings.cooldown(),
            sender: settings.sender.clone(),
            recipient: settings.recipient.clone(),
        }
    }
}

/// Global cooldown shared by every trigger type.
struct Cooldown {
    window: Duration,
    last_sent_at: Option<Instant>,
}

impl Cooldown {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_sent_at?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < self.window).then(|| self.window - elapsed)
    }
}

/// Rate-limited notification sender.
///
/// A single worker thread owns the transport and the cooldown timestamp, so the
/// check-and-update can never race between concurrent callers. The cooldown
/// only advances on confirmed transmission; a transport failure leaves the
/// window open for the next attempt.
#[derive(Clone)]
pub struct AlertDispatcher {
    inner: Arc<DispatcherInner>,
}

impl AlertDispatcher {
    pub fn new<T, C>(transport: T, clock: C, policy: DispatchPolicy) -> Result<Self>
    where
        T: Transport,
        C: Clock,
    {
        let (command_tx, command_rx) = mpsc::channel::<DispatchCommand>();

        let worker = thread::Builder::new()
            .name("healthguard-dispatch".into())
            .spawn(move || {
                let mut transport = transport;
                let mut cooldown = Cooldown {
                    window: policy.cooldown,
                    last_sent_at: None,
                };

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DispatchCommand::Send { message, reply } => {
                            let sent =
                                deliver(&mut transport, &clock, &mut cooldown, &policy, &message);
                            if reply.send(sent).is_err() {
                                debug!("Dispatch caller dropped before receiving result");
                            }
                        }
                        DispatchCommand::Shutdown => break,
                    }
                }

                info!("Dispatch thread shutting down");
            })
            .with_context(|| "failed to spawn dispatch worker thread")?;

        Ok(Self {
            inner: Arc::new(DispatcherInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub fn with_system_clock<T: Transport>(transport: T, policy: DispatchPolicy) -> Result<Self> {
        Self::new(transport, SystemClock, policy)
    }

    /// Submits `message`; resolves to `true` only if it was transmitted.
    pub async fn send(&self, message: impl Into<String>) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = DispatchCommand::Send {
            message: message.into(),
            reply: reply_tx,
        };

        if let Err(err) = self.inner.sender.send(command) {
            error!("Failed to hand notification to dispatch thread: {err}");
            return false;
        }

        match reply_rx.await {
            Ok(sent) => sent,
            Err(_) => {
                error!("Dispatch thread terminated before answering");
                false
            }
        }
    }
}

fn deliver<T: Transport, C: Clock>(
    transport: &mut T,
    clock: &C,
    cooldown: &mut Cooldown,
    policy: &DispatchPolicy,
    message: &str,
) -> bool {
    if let Some(remaining) = cooldown.remaining(clock.now()) {
        info!(
            "Notification suppressed; cooldown has {:.1}s remaining",
            remaining.as_secs_f64()
        );
        return false;
    }

    match transport.send(message, &policy.sender, &policy.recipient) {
        Ok(receipt) => {
            cooldown.last_sent_at = Some(clock.now());
            info!("Notification delivered to {} ({receipt})", policy.recipient);
            true
        }
        Err(err) => {
            error!("Notification transport failed: {err:#}");
            false
        }
    }
}
