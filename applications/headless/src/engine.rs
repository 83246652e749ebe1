//! Clock-driven stand-in for a real audio engine
//!
//! Decodes nothing. A background task advances the position while "playing"
//! and reports it through the same [`EngineEvent`] channel a real engine
//! would use, so the orchestrator can be exercised end to end.

use crate::config::EngineSettings;
use castline_playback::{AudioEngine, EngineEvent, PlaybackError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct EngineState {
    resource: Option<String>,
    position: Duration,
    duration: Duration,
    playing: bool,
    /// Bumped on every load so a late ready signal for an older resource is dropped
    generation: u64,
}

pub struct SimulatedEngine {
    this: Weak<SimulatedEngine>,
    settings: EngineSettings,
    state: Mutex<EngineState>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl SimulatedEngine {
    /// Create the engine and start its clock
    ///
    /// Must be called inside a tokio runtime. The returned receiver carries
    /// the engine's events; the host forwards them to the orchestrator.
    pub fn spawn(settings: EngineSettings) -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let tick = settings.tick();
        let engine = Arc::new_cyclic(|this| Self {
            this: this.clone(),
            settings,
            state: Mutex::new(EngineState::default()),
            events,
        });
        tokio::spawn(run_clock(Arc::downgrade(&engine), tick));
        (engine, receiver)
    }

    /// Adopt the episode length reported by the server
    ///
    /// Zero is ignored; the fallback length stays in effect. Until a length
    /// is adopted the episode runs `fallback_duration` past the load position.
    pub fn set_duration(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let mut state = self.lock();
        if state.duration != duration {
            debug!(duration_secs = duration.as_secs_f64(), "Simulated engine adopted duration");
            state.duration = duration;
            state.position = state.position.min(duration);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn advance(&self, elapsed: Duration) {
        let mut state = self.lock();
        if !state.playing {
            return;
        }
        state.position = (state.position + elapsed).min(state.duration);
        let position = state.position;
        let finished = position >= state.duration;
        if finished {
            state.playing = false;
        }
        drop(state);

        trace!(position_secs = position.as_secs_f64(), "Simulated tick");
        self.send(EngineEvent::PositionUpdate(position));
        if finished {
            self.send(EngineEvent::Finished);
        }
    }

    fn send(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            debug!("Engine event receiver dropped");
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_clock(engine: Weak<SimulatedEngine>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(engine) = engine.upgrade() else {
            break;
        };
        engine.advance(tick);
    }
}

impl AudioEngine for SimulatedEngine {
    fn load(&self, resource_locator: &str, start_position: Duration) -> Result<()> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.resource = Some(resource_locator.to_string());
            // The real length arrives later through set_duration
            state.duration = start_position + self.settings.fallback_duration();
            state.position = start_position;
            state.playing = false;
            state.generation
        };
        debug!(resource = %resource_locator, generation, "Simulated load");

        let this = self.this.clone();
        let delay = self.settings.load_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(engine) = this.upgrade() {
                if engine.lock().generation == generation {
                    engine.send(EngineEvent::ReadyToPlay);
                }
            }
        });
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut state = self.lock();
        if state.resource.is_none() {
            return Err(PlaybackError::engine("no resource loaded"));
        }
        if !state.playing {
            state.playing = true;
            drop(state);
            self.send(EngineEvent::Started);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut state = self.lock();
        if state.playing {
            state.playing = false;
            drop(state);
            self.send(EngineEvent::Paused);
        }
        Ok(())
    }

    fn seek(&self, position: Duration) -> Result<()> {
        let mut state = self.lock();
        if state.resource.is_none() {
            return Err(PlaybackError::engine("no resource loaded"));
        }
        state.position = position.min(state.duration);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.lock().position
    }

    fn duration(&self) -> Duration {
        let state = self.lock();
        if state.resource.is_some() {
            state.duration
        } else {
            Duration::ZERO
        }
    }
}
