//! Remote playback session and progress-sync policy
//!
//! A session is opened when a load succeeds and must be synced one last time
//! and explicitly ended before the next one opens. Sync rules:
//! - periodic: position moved at least `sync_interval` since the last sync
//! - immediate: on pause, on seek, and before close
//! - skipped when the position moved less than `min_sync_delta`, except on close

use crate::repository::{PlaybackSessionInfo, ProgressUpdate};
use crate::types::EpisodeRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One live remote playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub episode: EpisodeRef,
    pub duration: Duration,

    /// Playback position reported by the last sync
    pub last_synced_position: Duration,

    /// Wall-clock time of the last sync (`None` until the first one)
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}

impl Session {
    pub fn open(info: &PlaybackSessionInfo, episode: EpisodeRef) -> Self {
        Self {
            session_id: info.session_id.clone(),
            episode,
            duration: info.duration,
            last_synced_position: info.start_position,
            last_sync_timestamp: None,
        }
    }

    /// Distance moved since the last sync, in either direction
    pub fn delta_since_sync(&self, position: Duration) -> Duration {
        if position >= self.last_synced_position {
            position - self.last_synced_position
        } else {
            self.last_synced_position - position
        }
    }

    pub fn is_periodic_sync_due(&self, position: Duration, interval: Duration) -> bool {
        self.delta_since_sync(position) >= interval
    }

    /// Build the next progress push and record it as synced
    ///
    /// Returns `None` when the position moved less than `min_delta` and the
    /// sync is not forced. The bookkeeping advances before the remote call is
    /// made, so a failed push is superseded by the next one instead of retried.
    pub fn prepare_sync(
        &mut self,
        position: Duration,
        min_delta: Duration,
        force: bool,
    ) -> Option<ProgressUpdate> {
        if !force && self.delta_since_sync(position) < min_delta {
            return None;
        }

        let update = ProgressUpdate {
            session_id: self.session_id.clone(),
            position,
            duration: self.duration,
            // Seeking backwards is not negative listening
            time_listened: position.saturating_sub(self.last_synced_position),
        };

        self.last_synced_position = position;
        self.last_sync_timestamp = Some(Utc::now());
        Some(update)
    }
}
