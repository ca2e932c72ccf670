/*!
 * Error types for the subloop library.
 *
 * This module contains custom error types for the collaborators and the
 * control surface, using the thiserror crate for ergonomic error definitions.
 * None of these are fatal: every public operation reports them as values.
 */

use thiserror::Error;

/// Errors reported by the external player
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// Seeking to a position failed
    #[error("Seek to {position:.3}s failed: {message}")]
    Seek {
        /// Requested position in seconds
        position: f64,
        /// Message from the player
        message: String,
    },

    /// Creating or stopping a segment loop failed
    #[error("Loop primitive failed: {0}")]
    Loop(String),

    /// Reading or changing the playback rate failed
    #[error("Playback rate change failed: {0}")]
    Rate(String),

    /// Reading playback state (time, duration, track) failed
    #[error("Player query failed: {0}")]
    Query(String),

    /// No player is attached or it is not ready yet
    #[error("Player unavailable")]
    Unavailable,
}

/// Errors reported by the cache collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The cache answered with `success: false`
    #[error("Cache rejected operation on '{0}'")]
    Rejected(String),

    /// The cache backend failed
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// The stored value could not be (de)serialized
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Rejections from the loop marker state machine.
///
/// The display strings double as the transient notice shown to the learner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoopError {
    /// OUT was requested before IN
    #[error("Set the IN marker first")]
    MarkInRequired,

    /// Apply was requested without both markers
    #[error("Set IN and OUT markers before looping")]
    NoMarkers,

    /// The normalized loop is shorter than the configured minimum
    #[error("Loop too short ({length:.2}s, minimum {minimum:.2}s)")]
    LoopTooShort {
        /// Normalized loop length in seconds
        length: f64,
        /// Configured minimum in seconds
        minimum: f64,
    },

    /// The player refused a loop, seek or query
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),
}

/// Errors surfaced by the controls facade
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Error from the player
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Error from loop handling
    #[error("Loop error: {0}")]
    Loop(#[from] LoopError),
}
