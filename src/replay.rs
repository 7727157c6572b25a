//! Line-oriented driver: one JSON envelope per input line, one JSON result per
//! output line.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::monitor::Monitor;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Source {
    Esp32,
    Posture,
    Face,
    Event,
    Snapshot,
    History,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    source: Source,
    #[serde(default)]
    payload: Value,
    limit: Option<usize>,
}

pub async fn replay<R, W>(monitor: &Monitor, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => handle(monitor, envelope).await,
            Err(err) => {
                warn!("Skipping malformed envelope: {err}");
                json!({ "error": format!("malformed envelope: {err}") })
            }
        };

        let mut encoded = serde_json::to_vec(&response).context("failed to encode response")?;
        encoded.push(b'\n');
        output
            .write_all(&encoded)
            .await
            .context("failed to write response")?;
    }

    output.flush().await.context("failed to flush output")?;
    Ok(())
}

async fn handle(monitor: &Monitor, envelope: Envelope) -> Value {
    let outcome = match envelope.source {
        Source::Esp32 => monitor.ingest_esp32(&envelope.payload).await,
        Source::Posture => monitor.ingest_posture(&envelope.payload).await,
        Source::Face => monitor.ingest_face(&envelope.payload).await,
        Source::Event => monitor.ingest_event(&envelope.payload).await,
        Source::Snapshot => return json!({ "snapshot": monitor.snapshot() }),
        Source::History => return history(monitor, envelope.limit).await,
    };

    serde_json::to_value(&outcome).unwrap_or_else(|err| json!({ "error": err.to_string() }))
}

async fn history(monitor: &Monitor, limit: Option<usize>) -> Value {
    let vitals = monitor.history_vitals(limit).await;
    let environment = monitor.history_environment(limit).await;

    match (vitals, environment) {
        (Ok(vitals), Ok(environment)) => json!({ "vitals": vitals, "environment": environment }),
        (Err(err), _) | (_, Err(err)) => {
            warn!("History query failed: {err:#}");
            json!({ "error": format!("{err:#}") })
        }
    }
}
