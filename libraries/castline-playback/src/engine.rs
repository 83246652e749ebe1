//! Platform-agnostic audio engine trait
//!
//! Abstracts the player that actually decodes and outputs audio.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Platform-agnostic audio engine
///
/// Plays one media resource at a time. Commands are fire-and-forget: the
/// engine reports what actually happened through [`EngineEvent`]s, which the
/// host forwards to `Orchestrator::handle_engine_event`.
///
/// The orchestrator calls these methods while holding its internal state
/// lock, so an implementation must not call back into the orchestrator from
/// inside them. Queue the event and deliver it from another task instead.
pub trait AudioEngine: Send + Sync {
    /// Replace the current resource and start buffering it at `start_position`
    ///
    /// Completion is signalled later with [`EngineEvent::ReadyToPlay`] or
    /// [`EngineEvent::Failed`].
    fn load(&self, resource_locator: &str, start_position: Duration) -> Result<()>;

    /// Start or resume output
    fn play(&self) -> Result<()>;

    /// Pause output, keeping the position
    fn pause(&self) -> Result<()>;

    /// Jump to an absolute position
    fn seek(&self, position: Duration) -> Result<()>;

    /// Current playback position
    fn position(&self) -> Duration;

    /// Duration as known to the engine (may be zero before the resource is fully loaded)
    fn duration(&self) -> Duration;
}

/// Lifecycle events emitted by the audio engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// The loaded resource can play
    ReadyToPlay,

    /// Output started (possibly from outside the orchestrator)
    Started,

    /// Output paused (possibly from outside, e.g. a hardware media key)
    Paused,

    /// Periodic position report
    PositionUpdate(Duration),

    /// Reached the end of the resource
    Finished,

    /// Resource failed to initialize or play
    Failed(String),
}
