//! The match clock.
//!
//! A [`MatchClock`] maps wall-clock time onto the window of the game minute
//! currently being played. It stores a single anchor, the instant the
//! current minute began; everything else is derived from it and the
//! configured window length.

use chrono::{DateTime, TimeDelta, Utc};

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The window length cannot be used.
    #[error("invalid minute window: {reason}")]
    InvalidWindow {
        /// Explanation of what is wrong with the window.
        reason: String,
    },
}

/// Wall-clock window of the current game minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchClock {
    window: TimeDelta,
    anchor: Option<DateTime<Utc>>,
}

impl MatchClock {
    /// Create a clock whose minutes last `seconds_per_game_minute` real seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidWindow`] for a zero or out-of-range window.
    pub fn new(seconds_per_game_minute: u64) -> Result<Self, ClockError> {
        if seconds_per_game_minute == 0 {
            return Err(ClockError::InvalidWindow {
                reason: "seconds_per_game_minute must be at least 1".to_owned(),
            });
        }
        let window = i64::try_from(seconds_per_game_minute)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ClockError::InvalidWindow {
                reason: format!("{seconds_per_game_minute} seconds does not fit a time delta"),
            })?;
        Ok(Self {
            window,
            anchor: None,
        })
    }

    /// Set the anchor to `now` unless it is already set; returns the anchor.
    pub fn ensure_started(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.anchor.get_or_insert(now)
    }

    /// Reinstate an anchor recorded earlier, e.g. when rebuilding a session.
    pub const fn restore(&mut self, anchor: Option<DateTime<Utc>>) {
        self.anchor = anchor;
    }

    /// When the current minute began, if the clock has started.
    pub const fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }

    /// Length of one game minute.
    pub const fn window(&self) -> TimeDelta {
        self.window
    }

    /// Length of one game minute in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn window_seconds(&self) -> f64 {
        self.window.num_milliseconds() as f64 / 1000.0
    }

    /// When the current minute ends, if the clock has started.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.anchor.and_then(|anchor| anchor.checked_add_signed(self.window))
    }

    /// Seconds since the current minute began; zero before the clock starts
    /// or when `now` precedes the anchor.
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        self.anchor.map_or(0.0, |anchor| {
            let elapsed = now.signed_duration_since(anchor).num_milliseconds().max(0);
            elapsed as f64 / 1000.0
        })
    }

    /// Whether the current minute's window has run out.
    pub fn is_minute_over(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Seconds left in the current minute, never negative.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> f64 {
        (self.window_seconds() - self.elapsed_seconds(now)).max(0.0)
    }

    /// Start the next minute's window at `now`.
    pub const fn advance_minute_anchor(&mut self, now: DateTime<Utc>) {
        self.anchor = Some(now);
    }
}
