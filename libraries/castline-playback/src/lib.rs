//! Castline - Playback Coordination
//!
//! Keeps what the user asked for (play/pause) in step with what the audio
//! system can currently do (loading, ready, broken), while the audio engine
//! and the remote session service answer asynchronously.
//!
//! This crate provides:
//! - Intent / system-state model and derived View properties
//! - Reconciliation of intent against the audio engine
//! - Remote session lifecycle and progress-sync policy
//! - Cancellable auto-advance to the next episode
//!
//! # Architecture
//!
//! `castline-playback` does not decode audio and does not talk HTTP. The
//! audio engine ([`AudioEngine`]), the session store ([`MediaRepository`])
//! and the "what plays next" decision ([`EpisodeNavigator`]) are traits the
//! host application implements.
//!
//! # Example
//!
//! ```rust,no_run
//! use castline_playback::{
//!     AudioEngine, EngineEvent, EpisodeMetadata, EpisodeRef, IntentPolicy, MediaRepository,
//!     Orchestrator, PlaybackConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(repository: Arc<dyn MediaRepository>, engine: Arc<dyn AudioEngine>) {
//! let orchestrator = Orchestrator::new(repository, engine, PlaybackConfig::default());
//! let mut events = orchestrator.subscribe();
//!
//! // The user clicks play while the episode is still loading
//! let (loaded, ()) = tokio::join!(
//!     orchestrator.load_episode(
//!         EpisodeRef::new("show-1", "42"),
//!         EpisodeMetadata::titled("Episode 42"),
//!         IntentPolicy::Clear,
//!     ),
//!     async { orchestrator.request_play() },
//! );
//! loaded.ok();
//!
//! // Forwarded from the engine: playback starts now
//! orchestrator.handle_engine_event(EngineEvent::ReadyToPlay).await;
//! assert!(orchestrator.state().is_playing);
//!
//! while let Ok(event) = events.try_recv() {
//!     println!("{:?}", event);
//! }
//!
//! orchestrator.shutdown().await;
//! # }
//! ```

mod auto_advance;
mod engine;
mod error;
mod events;
mod orchestrator;
mod repository;
mod session;
pub mod types;

// Public exports
pub use engine::{AudioEngine, EngineEvent};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, ViewCommand};
pub use orchestrator::Orchestrator;
pub use repository::{EpisodeNavigator, MediaRepository, PlaybackSessionInfo, ProgressUpdate};
pub use session::Session;
pub use types::{
    DerivedPlaybackState, EpisodeMetadata, EpisodeRef, IntentPolicy, PlaybackConfig, SystemState,
    UserIntent,
};
