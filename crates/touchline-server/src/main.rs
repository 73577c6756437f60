//! Matchday server for Touchline.
//!
//! Loads the configuration and the matchday, kicks every fixture off and
//! runs one realtime loop per match until all of them have finished.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `touchline-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the matchday fixtures
//! 4. Connect the NATS publisher (falls back to the log publisher)
//! 5. Connect the `PostgreSQL` archive (optional)
//! 6. Prepare and kick off every fixture
//! 7. Spawn one realtime loop per match
//! 8. Wait for the final whistles (or Ctrl-C) and log the results
//! 9. Drop the queue senders and let the NATS and archive writers drain

mod archive;
mod error;
mod fixtures;
mod nats_publisher;
mod shutdown;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use touchline_core::{
    LogPublisher, LoopSummary, MatchRegistry, MatchServices, NoOpCallback, Publisher,
    RealtimeCallback, RealtimeError, TouchlineConfig, run_realtime_loop,
};
use touchline_db::PostgresPool;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::archive::{ArchiveCallback, ArchiveRecord, spawn_archive_writer};
use crate::error::ServerError;
use crate::fixtures::Matchday;
use crate::nats_publisher::NatsPublisher;
use crate::shutdown::Writers;

/// How long the writers get to flush their queues on the way out.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Application entry point for the matchday server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config)?;
    info!(
        seconds_per_game_minute = config.realtime.seconds_per_game_minute,
        tick_interval_ms = config.realtime.tick_interval_ms,
        match_length = config.realtime.match_length,
        "touchline-server starting"
    );

    // 3. Load the matchday.
    let matchday = Matchday::from_file(&config.fixtures.path).map_err(ServerError::from)?;
    let scheduled = matchday.schedule().map_err(ServerError::from)?;
    info!(
        path = %config.fixtures.path.display(),
        clubs = matchday.clubs.len(),
        fixtures = scheduled.len(),
        "Matchday loaded"
    );

    // 4. Connect the viewer transport.
    let mut writers = Writers::default();
    let infra = &config.infrastructure;
    let publisher: Arc<dyn Publisher> =
        match NatsPublisher::connect(&infra.nats_url, &infra.subject_prefix, infra.publish_buffer).await {
            Ok((publisher, writer)) => {
                writers.push("nats", writer);
                Arc::new(publisher)
            }
            Err(e) => {
                warn!(error = %e, "NATS unavailable, broadcasting to the log instead");
                Arc::new(LogPublisher)
            }
        };

    // 5. Connect the archive.
    let archive = connect_archive(&config, &mut writers).await;

    // 6. Kick off every fixture.
    let registry = MatchRegistry::new();
    for fixture in scheduled {
        let label = fixture.label;
        match registry.open(fixture.game, fixture.roster, &config.realtime) {
            Ok(session) => {
                let guard = session.lock();
                info!(match_id = %guard.match_id(), fixture = %label, seed = guard.game.seed, "Fixture kicked off");
            }
            Err(e) => warn!(fixture = %label, error = %e, "Fixture skipped"),
        }
    }
    if registry.is_empty() {
        return Err(ServerError::NoMatches {
            reason: "no fixture could be prepared".to_owned(),
        }
        .into());
    }

    // 7. One realtime loop per match.
    let services = MatchServices::new(&config, publisher);
    let mut loops: Vec<JoinHandle<Result<LoopSummary, RealtimeError>>> = Vec::new();
    for id in registry.ids() {
        let Some(session) = registry.get(&id) else {
            continue;
        };
        let services = services.clone();
        let mut callback: Box<dyn RealtimeCallback> = match &archive {
            Some(sender) => Box::new(ArchiveCallback::new(sender.clone())),
            None => Box::new(NoOpCallback),
        };
        loops.push(tokio::spawn(async move {
            run_realtime_loop(session, services, callback.as_mut()).await
        }));
    }
    info!(matches = loops.len(), "Realtime loops running");

    // 8. Wait for every match to finish.
    let aborts: Vec<_> = loops.iter().map(JoinHandle::abort_handle).collect();
    tokio::select! {
        results = futures::future::join_all(loops) => log_results(results),
        _ = tokio::signal::ctrl_c() => {
            warn!("Shutdown requested, abandoning live matches");
            for abort in &aborts {
                abort.abort();
            }
        }
    }

    // 9. Close the queues so the writers see the end, then let them drain.
    drop(services);
    drop(archive);
    let drained = writers.finish(SHUTDOWN_GRACE).await;
    info!(drained, "touchline-server shutdown complete");
    Ok(())
}

/// Load the configuration from `touchline-config.yaml` in the working
/// directory, or fall back to defaults.
fn load_config() -> Result<TouchlineConfig, ServerError> {
    let config_path = Path::new("touchline-config.yaml");
    if config_path.exists() {
        Ok(TouchlineConfig::from_file(config_path)?)
    } else {
        Ok(TouchlineConfig::default())
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &TouchlineConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ServerError::Logging {
        message: format!("{e}"),
    })
}

/// Connect to `PostgreSQL`, run migrations and start the archive writer.
///
/// Returns `None` (matches still run) when the database is unreachable.
async fn connect_archive(config: &TouchlineConfig, writers: &mut Writers) -> Option<mpsc::Sender<ArchiveRecord>> {
    let pool = match PostgresPool::connect_url(&config.infrastructure.postgres_url).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "Archive unavailable, running without it");
            return None;
        }
    };
    let (sender, writer) = spawn_archive_writer(pool, config.logging.archive_buffer);
    writers.push("archive", writer);
    info!("Archive writer started");
    Some(sender)
}

fn log_results(results: Vec<Result<Result<LoopSummary, RealtimeError>, tokio::task::JoinError>>) {
    for result in results {
        match result {
            Ok(Ok(summary)) => info!(
                match_id = %summary.match_id,
                status = summary.status.as_str(),
                minute = summary.minute,
                home_score = summary.score.home,
                away_score = summary.score.away,
                ticks = summary.ticks,
                contended = summary.contended,
                "Match loop ended"
            ),
            Ok(Err(e)) => error!(error = %e, "Match stalled"),
            Err(e) => error!(error = %e, "Match task panicked or was cancelled"),
        }
    }
}
