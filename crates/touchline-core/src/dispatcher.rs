//! Publishing due broadcast items.

use chrono::{DateTime, Utc};
use touchline_types::{BroadcastItem, BroadcastKey, OutboundMessage};
use tracing::{debug, warn};

use crate::publisher::{PublishError, Publisher};
use crate::session::MatchSession;

/// Publish up to `batch_size` due items and return the keys marked sent.
///
/// Items go out in `(scheduled_at, index)` order. Each one is published as
/// a `score_update` and a `possession_update` when its payload carries
/// them, then its `commentary_line`. The state snapshots go first because
/// they are safe to repeat: a failure before the commentary line leaves the
/// item pending, and the retry never shows viewers the same line twice.
/// The first publish failure ends the batch.
pub fn dispatch_batch(
    session: &mut MatchSession,
    publisher: &dyn Publisher,
    now: DateTime<Utc>,
    batch_size: usize,
) -> Vec<BroadcastKey> {
    if !publisher.is_available() {
        debug!(match_id = %session.game.id, "publisher unavailable, skipping dispatch");
        return Vec::new();
    }

    let mut sent = Vec::new();
    for key in session.ledger.pending_due(now, batch_size) {
        let Some(item) = session.ledger.get(&key) else {
            continue;
        };
        if let Err(err) = publish_item(publisher, item) {
            warn!(
                match_id = %session.game.id,
                key = %key,
                error = %err,
                "publish failed, item stays pending"
            );
            break;
        }
        if session.ledger.mark_sent(&key, now) {
            sent.push(key);
        }
    }
    sent
}

/// Publish up to `batch_size` due items and return how many were sent.
///
/// Returns 0 when the publisher reports itself unavailable.
pub fn dispatch_ready(
    session: &mut MatchSession,
    publisher: &dyn Publisher,
    now: DateTime<Utc>,
    batch_size: usize,
) -> usize {
    dispatch_batch(session, publisher, now, batch_size).len()
}

/// The messages one item fans out to, commentary line last.
pub fn messages_for(item: &BroadcastItem) -> Vec<OutboundMessage> {
    let match_id = item.key.match_id;
    let minute = item.key.minute;
    let mut messages = Vec::with_capacity(3);
    if let Some(score) = item.payload.score {
        messages.push(OutboundMessage::ScoreUpdate {
            match_id,
            minute,
            score,
        });
    }
    if let Some(possession) = &item.payload.possession {
        messages.push(OutboundMessage::PossessionUpdate {
            match_id,
            minute,
            possession: possession.clone(),
        });
    }
    messages.push(OutboundMessage::CommentaryLine {
        match_id,
        key: item.key.to_string(),
        payload: item.payload.clone(),
    });
    messages
}

fn publish_item(publisher: &dyn Publisher, item: &BroadcastItem) -> Result<(), PublishError> {
    for message in messages_for(item) {
        publisher.publish(&message)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeDelta;
    use touchline_types::{
        BroadcastKind, BroadcastPayload, BroadcastStatus, MessageKind, PossessionUpdate,
        ScoreUpdate, TeamSide,
    };

    use super::*;
    use crate::publisher::ChannelPublisher;
    use crate::session::fixtures::live_session;

    fn payload(minute: u32) -> BroadcastPayload {
        BroadcastPayload {
            text: "line".to_owned(),
            kind: BroadcastKind::MicroPass,
            minute,
            club_id: None,
            player_ids: Vec::new(),
            score: None,
            possession: None,
        }
    }

    fn seeded(count: u32, at: DateTime<Utc>) -> MatchSession {
        let mut session = live_session(8);
        let id = session.match_id();
        let items = (0..count).map(|i| BroadcastItem::pending(BroadcastKey::new(id, 1, i), at, payload(1)));
        session.ledger.persist(items);
        session
    }

    /// Fails every publish after the first `ok` calls.
    struct Flaky {
        ok: usize,
        calls: AtomicUsize,
    }

    impl Publisher for Flaky {
        fn is_available(&self) -> bool {
            true
        }

        fn publish(&self, _message: &OutboundMessage) -> Result<(), PublishError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.ok {
                Ok(())
            } else {
                Err(PublishError::Unavailable { reason: "flaky".to_owned() })
            }
        }
    }

    #[test]
    fn batches_are_bounded_and_ordered() {
        let now = Utc::now();
        let mut session = seeded(5, now);
        let (publisher, mut rx) = ChannelPublisher::new(32);

        assert_eq!(dispatch_ready(&mut session, &publisher, now, 3), 3);
        assert_eq!(dispatch_ready(&mut session, &publisher, now, 3), 2);
        assert_eq!(dispatch_ready(&mut session, &publisher, now, 3), 0);

        let mut keys = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let OutboundMessage::CommentaryLine { key, .. } = message {
                keys.push(key);
            }
        }
        let id = session.match_id();
        let expected: Vec<String> = (0..5).map(|i| format!("{id}:1:{i}")).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn future_items_wait() {
        let now = Utc::now();
        let mut session = seeded(2, now + TimeDelta::seconds(30));
        let (publisher, _rx) = ChannelPublisher::new(8);
        assert_eq!(dispatch_ready(&mut session, &publisher, now, 10), 0);
        assert_eq!(dispatch_ready(&mut session, &publisher, now + TimeDelta::seconds(30), 10), 2);
    }

    #[test]
    fn unavailable_publisher_sends_nothing() {
        let now = Utc::now();
        let mut session = seeded(2, now);
        let (publisher, rx) = ChannelPublisher::new(8);
        drop(rx);
        assert_eq!(dispatch_ready(&mut session, &publisher, now, 10), 0);
        assert_eq!(session.ledger.pending_count(), 2);
    }

    #[test]
    fn failed_publish_leaves_the_item_pending() {
        let now = Utc::now();
        let mut session = seeded(3, now);
        let flaky = Flaky { ok: 1, calls: AtomicUsize::new(0) };
        assert_eq!(dispatch_ready(&mut session, &flaky, now, 10), 1);
        let id = session.match_id();
        let second = session.ledger.get(&BroadcastKey::new(id, 1, 1)).unwrap();
        assert_eq!(second.status, BroadcastStatus::Pending);
        assert_eq!(session.ledger.pending_count(), 2);
    }

    #[test]
    fn score_and_possession_ride_along() {
        let now = Utc::now();
        let mut session = live_session(9);
        let id = session.match_id();
        let mut goal = payload(4);
        goal.kind = BroadcastKind::Goal;
        goal.score = Some(ScoreUpdate { home: 1, away: 0 });
        goal.possession = Some(PossessionUpdate {
            side: TeamSide::Away,
            club_id: session.game.away_club,
            zone: Some("GK".to_owned()),
        });
        session.ledger.persist([BroadcastItem::pending(BroadcastKey::new(id, 4, 0), now, goal)]);
        let (publisher, mut rx) = ChannelPublisher::new(8);

        assert_eq!(dispatch_ready(&mut session, &publisher, now, 10), 1);

        let kinds: Vec<MessageKind> = std::iter::from_fn(|| rx.try_recv().ok()).map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::ScoreUpdate, MessageKind::PossessionUpdate, MessageKind::CommentaryLine]
        );
    }

    /// Counts the commentary lines that actually went out.
    struct FailsOnce {
        failed: AtomicUsize,
        lines: AtomicUsize,
    }

    impl Publisher for FailsOnce {
        fn is_available(&self) -> bool {
            true
        }

        fn publish(&self, message: &OutboundMessage) -> Result<(), PublishError> {
            if message.kind() == MessageKind::PossessionUpdate && self.failed.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(PublishError::Unavailable { reason: "hiccup".to_owned() });
            }
            if message.kind() == MessageKind::CommentaryLine {
                self.lines.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[test]
    fn retried_goal_shows_its_line_once() {
        let now = Utc::now();
        let mut session = live_session(9);
        let id = session.match_id();
        let mut goal = payload(7);
        goal.kind = BroadcastKind::Goal;
        goal.score = Some(ScoreUpdate { home: 0, away: 1 });
        goal.possession = Some(PossessionUpdate {
            side: TeamSide::Home,
            club_id: session.game.home_club,
            zone: Some("GK".to_owned()),
        });
        session.ledger.persist([BroadcastItem::pending(BroadcastKey::new(id, 7, 0), now, goal)]);
        let publisher = FailsOnce {
            failed: AtomicUsize::new(0),
            lines: AtomicUsize::new(0),
        };

        assert_eq!(dispatch_ready(&mut session, &publisher, now, 10), 0);
        assert_eq!(publisher.lines.load(Ordering::SeqCst), 0);
        assert_eq!(session.ledger.pending_count(), 1);

        assert_eq!(dispatch_ready(&mut session, &publisher, now, 10), 1);
        assert_eq!(publisher.lines.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sent_items_never_come_back() {
        let now = Utc::now();
        let mut session = seeded(1, now);
        let (publisher, _rx) = ChannelPublisher::new(8);
        let sent = dispatch_batch(&mut session, &publisher, now, 10);
        assert_eq!(sent.len(), 1);
        assert!(dispatch_batch(&mut session, &publisher, now, 10).is_empty());
        assert!(dispatch_batch(&mut session, &publisher, now + TimeDelta::hours(2), 10).is_empty());
    }
}
