//! NATS-backed [`Publisher`].
//!
//! The realtime tick must never wait on the network, so [`NatsPublisher`]
//! only pushes messages into a bounded queue. A background task drains the
//! queue and publishes each message as JSON on `{prefix}.{match_id}`.
//!
//! A full queue is reported as [`PublishError::Unavailable`]; the
//! dispatcher then leaves the item pending and retries on a later tick.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use touchline_core::{PublishError, Publisher};
use touchline_types::{MatchId, OutboundMessage};
use tracing::{debug, info, warn};

use crate::error::ServerError;

/// Publishes viewer messages to NATS through a bounded queue.
#[derive(Debug, Clone)]
pub struct NatsPublisher {
    sender: mpsc::Sender<OutboundMessage>,
}

impl NatsPublisher {
    /// Connect to NATS and start the background writer.
    pub async fn connect(
        url: &str,
        subject_prefix: &str,
        buffer: usize,
    ) -> Result<(Self, JoinHandle<()>), ServerError> {
        let client = async_nats::connect(url).await.map_err(|e| ServerError::Nats {
            message: format!("failed to connect to NATS at {url}: {e}"),
        })?;
        info!(nats_url = url, subject_prefix, "NATS publisher connected");
        Ok(Self::spawn(client, subject_prefix.to_owned(), buffer))
    }

    /// Start the background writer on an existing client.
    pub fn spawn(client: async_nats::Client, subject_prefix: String, buffer: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(drain(client, subject_prefix, receiver));
        (Self { sender }, handle)
    }

    /// Number of messages the queue can still take.
    pub fn headroom(&self) -> usize {
        self.sender.capacity()
    }
}

impl Publisher for NatsPublisher {
    fn is_available(&self) -> bool {
        !self.sender.is_closed()
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        self.sender.try_send(message.clone()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PublishError::Unavailable {
                reason: "NATS publish queue is full".to_owned(),
            },
            mpsc::error::TrySendError::Closed(_) => PublishError::Unavailable {
                reason: "NATS writer has stopped".to_owned(),
            },
        })
    }
}

/// Subject a match's messages are published on.
pub fn subject_for(prefix: &str, match_id: MatchId) -> String {
    format!("{prefix}.{match_id}")
}

async fn drain(client: async_nats::Client, prefix: String, mut receiver: mpsc::Receiver<OutboundMessage>) {
    while let Some(message) = receiver.recv().await {
        let subject = subject_for(&prefix, message.match_id());
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subject, error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!(subject, error = %e, "NATS publish failed, message dropped");
        } else {
            debug!(subject, kind = ?message.kind(), "published");
        }
    }
    if let Err(e) = client.flush().await {
        warn!(error = %e, "final NATS flush failed");
    }
    info!("NATS writer stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use touchline_types::ScoreUpdate;

    use super::*;

    fn message(match_id: MatchId) -> OutboundMessage {
        OutboundMessage::ScoreUpdate {
            match_id,
            minute: 9,
            score: ScoreUpdate { home: 0, away: 1 },
        }
    }

    #[test]
    fn subjects_are_per_match() {
        let id = MatchId::new();
        assert_eq!(subject_for("touchline.match", id), format!("touchline.match.{id}"));
    }

    #[test]
    fn full_queue_is_unavailable() {
        let (sender, mut receiver) = mpsc::channel(1);
        let publisher = NatsPublisher { sender };
        let id = MatchId::new();
        publisher.publish(&message(id)).unwrap();
        assert_eq!(publisher.headroom(), 0);
        assert!(matches!(publisher.publish(&message(id)), Err(PublishError::Unavailable { .. })));
        assert_eq!(receiver.try_recv().unwrap().match_id(), id);
    }

    #[test]
    fn stopped_writer_is_reported() {
        let (sender, receiver) = mpsc::channel(4);
        let publisher = NatsPublisher { sender };
        drop(receiver);
        assert!(!publisher.is_available());
        assert!(publisher.publish(&message(MatchId::new())).is_err());
    }
}
