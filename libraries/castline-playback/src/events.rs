//! Playback Events
//!
//! Outbound notifications for the View and other collaborators, and the
//! inbound commands the View sends. Every subscriber gets its own unbounded
//! channel; emission never blocks and never calls back into subscriber code.

use crate::types::{DerivedPlaybackState, EpisodeMetadata, EpisodeRef};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Derived playback properties changed (pushed on every transition)
    StateChanged(DerivedPlaybackState),

    /// An episode load began
    EpisodeChanged(EpisodeRef),

    /// Auto-advance is leaving this episode for the next one
    EpisodeEnded(EpisodeRef),

    /// A load or the engine failed
    Error {
        /// Error message
        message: String,
    },
}

/// User actions coming from the View
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewCommand {
    PlayRequest,
    PauseRequest,

    /// Seek to a fraction of the episode (0.0..=1.0)
    Seek(f64),

    /// User picked another episode
    EpisodeChange {
        show_id: String,
        episode_id: String,
        metadata: EpisodeMetadata,
    },
}

/// Fan-out of [`PlaybackEvent`]s to subscribers
#[derive(Debug, Default)]
pub(crate) struct EventHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PlaybackEvent>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones that hung up
    pub(crate) fn emit(&self, event: &PlaybackEvent) {
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop all senders so receivers observe end-of-stream
    pub(crate) fn close(&self) {
        self.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<PlaybackEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
