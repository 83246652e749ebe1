//! Remote session tracking and episode navigation seams

use crate::error::Result;
use crate::types::{EpisodeMetadata, EpisodeRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response to opening a remote playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSessionInfo {
    pub session_id: String,

    /// Where the engine fetches the audio from
    pub resource_locator: String,

    /// Episode length as known to the server
    pub duration: Duration,

    /// Saved position to resume from
    pub start_position: Duration,
}

/// One progress push for an open session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub session_id: String,
    pub position: Duration,
    pub duration: Duration,

    /// Listening time since the previous sync, never negative
    pub time_listened: Duration,
}

/// Async facade over remote playback-session storage
///
/// Every call may fail; the orchestrator decides which failures are surfaced.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Open a session for an episode
    async fn start_playback(&self, episode: &EpisodeRef) -> Result<PlaybackSessionInfo>;

    /// Push progress for an open session
    async fn update_progress(&self, update: &ProgressUpdate) -> Result<()>;

    /// Close a session
    async fn end_playback(&self, session_id: &str) -> Result<()>;
}

/// Picks what auto-advance plays after an episode finishes
///
/// Returns `None` when there is nothing to advance to.
pub trait EpisodeNavigator: Send + Sync {
    fn next_episode(&self, finished: &EpisodeRef) -> Option<(EpisodeRef, EpisodeMetadata)>;
}
