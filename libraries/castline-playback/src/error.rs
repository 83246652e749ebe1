//! Error types for playback coordination

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The repository refused to open a playback session
    #[error("Failed to load episode {show_id}/{episode_id}: {reason}")]
    LoadFailed {
        show_id: String,
        episode_id: String,
        reason: String,
    },

    /// Media repository call failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// Audio engine rejected a command
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// A newer load started before this one finished
    #[error("Load superseded by a newer episode change")]
    Superseded,

    /// No playback session is open
    #[error("No active playback session")]
    NoSession,

    /// Progress outside 0..=1 or not a number
    #[error("Invalid progress value: {0}")]
    InvalidProgress(f64),

    /// The orchestrator has been shut down
    #[error("Orchestrator is shut down")]
    ShutDown,
}

impl PlaybackError {
    /// Create a repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
