//! The outbound publish seam.
//!
//! The realtime loop treats the viewer transport as an opaque
//! [`Publisher`]. Two implementations live here: [`LogPublisher`] writes
//! every message to the tracing log, [`ChannelPublisher`] fans messages out
//! to in-process subscribers over a `tokio` broadcast channel. The server
//! adds a NATS-backed publisher.

use tokio::sync::broadcast;
use touchline_types::OutboundMessage;
use tracing::info;

/// Errors that can occur when publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The transport cannot take messages right now.
    #[error("publisher unavailable: {reason}")]
    Unavailable {
        /// Why the transport is unavailable.
        reason: String,
    },

    /// The message could not be encoded.
    #[error("failed to encode outbound message: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Sink for viewer-facing messages.
///
/// `publish` is called from inside the per-match critical section, so it
/// must not block on I/O.
pub trait Publisher: Send + Sync {
    /// Whether the transport currently accepts messages.
    fn is_available(&self) -> bool;

    /// Publish one message.
    fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError>;
}

/// Writes every message to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn is_available(&self) -> bool {
        true
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        let body = serde_json::to_string(message)?;
        info!(
            match_id = %message.match_id(),
            kind = ?message.kind(),
            body = %body,
            "outbound message"
        );
        Ok(())
    }
}

/// Fans messages out to in-process subscribers.
///
/// Available only while at least one receiver is alive.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: broadcast::Sender<OutboundMessage>,
}

impl ChannelPublisher {
    /// A publisher with room for `capacity` unread messages per subscriber,
    /// plus a first subscriber.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<OutboundMessage>) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Add a subscriber that sees messages published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.sender.subscribe()
    }
}

impl Publisher for ChannelPublisher {
    fn is_available(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
        self.sender
            .send(message.clone())
            .map(|_| ())
            .map_err(|_closed| PublishError::Unavailable {
                reason: "no subscribers".to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use touchline_types::{MatchId, ScoreUpdate};

    use super::*;

    fn score(match_id: MatchId) -> OutboundMessage {
        OutboundMessage::ScoreUpdate {
            match_id,
            minute: 3,
            score: ScoreUpdate { home: 1, away: 0 },
        }
    }

    #[test]
    fn log_publisher_always_accepts() {
        let publisher = LogPublisher;
        assert!(publisher.is_available());
        assert!(publisher.publish(&score(MatchId::new())).is_ok());
    }

    #[test]
    fn channel_publisher_delivers_to_subscribers() {
        let (publisher, mut rx) = ChannelPublisher::new(8);
        let id = MatchId::new();
        publisher.publish(&score(id)).unwrap();
        let got = rx.try_recv().unwrap();
        assert_eq!(got.match_id(), id);
    }

    #[test]
    fn channel_publisher_without_subscribers_is_unavailable() {
        let (publisher, rx) = ChannelPublisher::new(8);
        drop(rx);
        assert!(!publisher.is_available());
        assert!(matches!(
            publisher.publish(&score(MatchId::new())),
            Err(PublishError::Unavailable { .. })
        ));
    }
}
