//! Core types for playback coordination

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What the user most recently asked for
///
/// Only explicit user actions and load policies change this. Engine and
/// repository callbacks never write it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserIntent {
    /// User wants audio
    Play,

    /// User explicitly paused
    Pause,

    /// No standing request (fresh episode, or the last one finished)
    #[default]
    None,
}

/// Whether the audio engine currently holds a playable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SystemState {
    /// Resource is initialized and playable
    Ready,

    /// An episode load is in flight
    #[default]
    Loading,

    /// The load or the engine failed
    Error,
}

/// How `load_episode` treats the current intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentPolicy {
    /// Manual episode change: the user picked content, not necessarily playback
    Clear,

    /// Keep whatever the user asked for last
    Preserve,

    /// Auto-advance: start the next episode without a fresh click
    ForcePlay,
}

impl IntentPolicy {
    /// Intent after applying this policy to `current`
    pub fn apply(self, current: UserIntent) -> UserIntent {
        match self {
            IntentPolicy::Clear => UserIntent::None,
            IntentPolicy::Preserve => current,
            IntentPolicy::ForcePlay => UserIntent::Play,
        }
    }
}

/// Identifies one episode of one show
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub show_id: String,
    pub episode_id: String,
}

impl EpisodeRef {
    pub fn new(show_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            show_id: show_id.into(),
            episode_id: episode_id.into(),
        }
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.show_id, self.episode_id)
    }
}

/// Display metadata handed in by the View alongside an episode change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    /// Episode title
    pub title: String,

    /// Show title (optional)
    pub show_title: Option<String>,

    /// Artwork location (optional)
    pub artwork_url: Option<String>,
}

impl EpisodeMetadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Playback properties pushed to the View
///
/// A pure function of intent, system state, position and duration. Whenever
/// `system` is not `Error`, exactly one of `is_playing`, `is_loading` and
/// `is_paused` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedPlaybackState {
    pub is_playing: bool,
    pub is_loading: bool,
    pub is_paused: bool,

    /// Grid navigation must stay put while audio is wanted or loading
    pub navigation_locked: bool,

    /// Position over duration, 0.0 when the duration is unknown
    pub progress: f64,

    pub has_error: bool,
    pub intent: UserIntent,
    pub system: SystemState,
    pub position: Duration,
    pub duration: Duration,
}

impl DerivedPlaybackState {
    pub fn derive(
        intent: UserIntent,
        system: SystemState,
        position: Duration,
        duration: Duration,
    ) -> Self {
        let wants_play = intent == UserIntent::Play;
        let progress = if duration.is_zero() {
            0.0
        } else {
            (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        };

        Self {
            is_playing: wants_play && system == SystemState::Ready,
            is_loading: wants_play && system == SystemState::Loading,
            // A non-playing intent while loading still shows the play affordance
            is_paused: !wants_play && system != SystemState::Error,
            navigation_locked: wants_play || system == SystemState::Loading,
            progress,
            has_error: system == SystemState::Error,
            intent,
            system,
            position,
            duration,
        }
    }
}

/// Tunables for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Position delta that triggers a periodic progress sync (default: 10s)
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Syncs closer than this to the previous one are skipped (default: 1000ms)
    #[serde(default = "default_min_sync_delta_ms")]
    pub min_sync_delta_ms: u64,

    /// Pause between an episode finishing and the next one loading (default: 300ms)
    #[serde(default = "default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,
}

impl PlaybackConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn min_sync_delta(&self) -> Duration {
        Duration::from_millis(self.min_sync_delta_ms)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

fn default_sync_interval_secs() -> u64 {
    10
}

fn default_min_sync_delta_ms() -> u64 {
    1000
}

fn default_auto_advance_delay_ms() -> u64 {
    300
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: default_sync_interval_secs(),
            min_sync_delta_ms: default_min_sync_delta_ms(),
            auto_advance_delay_ms: default_auto_advance_delay_ms(),
        }
    }
}
