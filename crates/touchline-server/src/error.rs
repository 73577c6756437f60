//! Error types for the matchday server.
//!
//! [`ServerError`] is the top-level error type that `main` propagates
//! with `?`. Infrastructure that the server can run without (NATS, the
//! archive) is logged and skipped instead of ending up here.

use crate::fixtures::FixtureError;

/// Top-level error for the matchday server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: touchline_core::ConfigError,
    },

    /// The matchday file could not be loaded.
    #[error("fixture error: {source}")]
    Fixtures {
        /// The underlying fixture error.
        #[from]
        source: FixtureError,
    },

    /// No fixture could be kicked off.
    #[error("nothing to play: {reason}")]
    NoMatches {
        /// Why every fixture was skipped.
        reason: String,
    },

    /// NATS connection failed.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
