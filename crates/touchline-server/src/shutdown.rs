//! Draining the background writers on the way out.
//!
//! The NATS writer and the archive writer stop once every sender of their
//! queue is gone. Shutdown drops the senders first, then waits here so the
//! last commentary lines, the full-time update and the final scoreboard
//! still leave the process.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Background writers that must drain before the process exits.
#[derive(Debug, Default)]
pub struct Writers {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Writers {
    /// Track a writer task under `name`.
    pub fn push(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.handles.push((name, handle));
    }

    /// Wait up to `grace` in total for every writer to finish and return how
    /// many drained cleanly. Writers still running at the deadline are
    /// aborted.
    pub async fn finish(mut self, grace: Duration) -> usize {
        let mut drained = 0_usize;
        let waited = tokio::time::timeout(grace, async {
            for (name, handle) in &mut self.handles {
                match handle.await {
                    Ok(()) => {
                        drained = drained.saturating_add(1);
                        info!(writer = *name, "Writer drained");
                    }
                    Err(e) => warn!(writer = *name, error = %e, "Writer ended abnormally"),
                }
            }
        })
        .await;

        if waited.is_err() {
            for (name, handle) in &self.handles {
                if !handle.is_finished() {
                    warn!(writer = *name, grace_ms = grace.as_millis(), "Writer still busy, aborting");
                    handle.abort();
                }
            }
        }
        drained
    }
}
