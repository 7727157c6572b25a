pub mod db;
pub mod dispatch;
pub mod ingest;
pub mod models;
pub mod monitor;
pub mod risk;
pub mod settings;
pub mod state;
pub mod vitals;

mod replay;

use std::sync::Arc;

use anyhow::Context;
use log::{error, info};

use db::Database;
use dispatch::{AlertDispatcher, DispatchPolicy, LogTransport};
use risk::{GuidelineAdvisor, ScoringClassifier};
use settings::MonitorSettings;

pub use monitor::{IngestOutcome, Monitor};

/// Replays newline-delimited envelopes from stdin against a fresh monitor.
pub fn run() -> anyhow::Result<()> {
    let debug = std::env::var("HEALTHGUARD_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("HealthGuard starting up...");

    let settings = MonitorSettings::from_env()?;

    let history = match &settings.database_path {
        Some(path) => match Database::new(path.clone()) {
            Ok(database) => Some(database),
            Err(err) => {
                error!("History store unavailable, continuing without it: {err:#}");
                None
            }
        },
        None => None,
    };

    let dispatcher =
        AlertDispatcher::with_system_clock(LogTransport, DispatchPolicy::from(&settings.alerts))?;

    let monitor = Monitor::new(
        &settings,
        dispatcher,
        Arc::new(ScoringClassifier::default()),
        Arc::new(GuidelineAdvisor),
        history,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        replay::replay(&monitor, stdin, &mut stdout).await
    })?;

    info!("Input exhausted, shutting down");
    Ok(())
}
