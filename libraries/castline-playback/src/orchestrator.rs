//! Playback orchestrator - core coordination
//!
//! Reconciles user intent against what the audio engine can currently do,
//! owns the remote playback session and sequences auto-advance.
//!
//! Intent is a single mutable cell. Every change to intent or to system
//! state re-runs reconciliation, so a `Play` requested while an episode is
//! still loading is honoured the moment the engine reports ready, with no
//! queued commands. All state lives behind one mutex that is never held
//! across an `.await`. Remote session transitions (close the old session,
//! open the new one) are serialized by a separate async gate, so at most one
//! remote session is ever open.

use crate::{
    auto_advance::AutoAdvance,
    engine::{AudioEngine, EngineEvent},
    error::{PlaybackError, Result},
    events::{EventHub, PlaybackEvent, ViewCommand},
    repository::{EpisodeNavigator, MediaRepository, ProgressUpdate},
    session::Session,
    types::{
        DerivedPlaybackState, EpisodeMetadata, EpisodeRef, IntentPolicy, PlaybackConfig,
        SystemState, UserIntent,
    },
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Mutable coordination state
#[derive(Debug, Default)]
struct Core {
    intent: UserIntent,
    system: SystemState,
    position: Duration,
    duration: Duration,
    episode: Option<EpisodeRef>,
    metadata: Option<EpisodeMetadata>,
    session: Option<Session>,

    // Bumped by every load; completions carrying an older value are stale
    load_generation: u64,
    // The newest load handed its resource to the engine
    resource_handed_over: bool,

    auto_advance: AutoAdvance,
    shut_down: bool,
}

impl Core {
    fn derived(&self) -> DerivedPlaybackState {
        DerivedPlaybackState::derive(self.intent, self.system, self.position, self.duration)
    }
}

struct Shared {
    repository: Arc<dyn MediaRepository>,
    engine: Arc<dyn AudioEngine>,
    navigator: Mutex<Option<Arc<dyn EpisodeNavigator>>>,
    config: PlaybackConfig,
    core: Mutex<Core>,
    // Held across close-then-start so remote sessions never overlap
    transition: tokio::sync::Mutex<()>,
    events: EventHub,
}

/// Central playback coordination
///
/// Cheap to clone; clones share the same state. Constructed explicitly with
/// its collaborators and torn down with [`Orchestrator::shutdown`], which
/// closes the live session.
///
/// Engine events must be forwarded to [`Orchestrator::handle_engine_event`].
/// Timers use the tokio runtime the orchestrator is driven from.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    /// Create new orchestrator
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        engine: Arc<dyn AudioEngine>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                repository,
                engine,
                navigator: Mutex::new(None),
                config,
                core: Mutex::new(Core::default()),
                transition: tokio::sync::Mutex::new(()),
                events: EventHub::default(),
            }),
        }
    }

    /// Install the collaborator that chooses the next episode for auto-advance
    pub fn set_navigator(&self, navigator: Arc<dyn EpisodeNavigator>) {
        *self
            .shared
            .navigator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(navigator);
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    // ===== Queries =====

    /// Derived playback state (pure, no side effects)
    pub fn state(&self) -> DerivedPlaybackState {
        self.lock().derived()
    }

    /// Episode currently loaded or loading
    pub fn current_episode(&self) -> Option<EpisodeRef> {
        self.lock().episode.clone()
    }

    /// Metadata supplied with the current episode
    pub fn current_metadata(&self) -> Option<EpisodeMetadata> {
        self.lock().metadata.clone()
    }

    /// Snapshot of the live remote session
    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    pub fn is_auto_advance_pending(&self) -> bool {
        self.lock().auto_advance.is_pending()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    // ===== User intent =====

    /// User asked for audio
    pub fn request_play(&self) {
        self.set_intent(UserIntent::Play);
    }

    /// User asked for silence
    pub fn request_pause(&self) {
        self.set_intent(UserIntent::Pause);
    }

    fn set_intent(&self, intent: UserIntent) {
        let mut core = self.lock();
        if core.shut_down {
            debug!(?intent, "Ignoring intent after shutdown");
            return;
        }

        if core.auto_advance.cancel() {
            debug!("Auto-advance cancelled by user action");
        }
        core.intent = intent;
        self.reconcile(&mut core);
    }

    /// Route a View command to the matching operation
    pub async fn dispatch(&self, command: ViewCommand) -> Result<()> {
        match command {
            ViewCommand::PlayRequest => {
                self.request_play();
                Ok(())
            }
            ViewCommand::PauseRequest => {
                self.request_pause();
                Ok(())
            }
            ViewCommand::Seek(progress) => self.seek_to_progress(progress).await,
            ViewCommand::EpisodeChange {
                show_id,
                episode_id,
                metadata,
            } => {
                self.load_episode(
                    EpisodeRef::new(show_id, episode_id),
                    metadata,
                    IntentPolicy::Clear,
                )
                .await
            }
        }
    }

    // ===== Loading =====

    /// Switch to another episode
    ///
    /// `system` becomes `Loading` before the first suspension point, so any
    /// intent set while this call is in flight is fulfilled once the engine
    /// reports ready. The previous session is synced and closed before the
    /// new one opens. On repository failure `system` becomes `Error` and
    /// intent is left as it was so the user can retry.
    pub async fn load_episode(
        &self,
        episode: EpisodeRef,
        metadata: EpisodeMetadata,
        policy: IntentPolicy,
    ) -> Result<()> {
        let (generation, previous) = {
            let mut core = self.lock();
            if core.shut_down {
                return Err(PlaybackError::ShutDown);
            }
            self.begin_load(&mut core, episode.clone(), metadata, policy)
        };

        self.finish_load(generation, previous, episode).await
    }

    /// Synchronous half of a load: intent, Loading, bookkeeping, events
    ///
    /// Returns the new load generation and the session to close.
    fn begin_load(
        &self,
        core: &mut Core,
        episode: EpisodeRef,
        metadata: EpisodeMetadata,
        policy: IntentPolicy,
    ) -> (u64, Option<(Session, Duration)>) {
        if core.auto_advance.cancel() {
            debug!("Auto-advance cancelled by episode change");
        }

        core.intent = policy.apply(core.intent);
        core.system = SystemState::Loading;
        core.load_generation += 1;
        core.resource_handed_over = false;

        let position = core.position;
        let previous = core.session.take().map(|session| (session, position));
        core.position = Duration::ZERO;
        core.duration = Duration::ZERO;
        core.metadata = Some(metadata);

        info!(episode = %episode, ?policy, "Loading episode");
        self.emit(&PlaybackEvent::EpisodeChanged(episode.clone()));
        core.episode = Some(episode);
        self.reconcile(core);

        (core.load_generation, previous)
    }

    /// Remote half of a load: close the previous session, open the next
    async fn finish_load(
        &self,
        generation: u64,
        previous: Option<(Session, Duration)>,
        episode: EpisodeRef,
    ) -> Result<()> {
        let _transition = self.shared.transition.lock().await;

        if let Some((session, position)) = previous {
            self.close_session(session, position).await;
        }

        {
            let core = self.lock();
            if core.shut_down {
                debug!(episode = %episode, "Load abandoned by shutdown");
                return Err(PlaybackError::ShutDown);
            }
            if core.load_generation != generation {
                debug!(episode = %episode, "Load superseded before opening a session");
                return Err(PlaybackError::Superseded);
            }
        }

        let info = match self.shared.repository.start_playback(&episode).await {
            Ok(info) => info,
            Err(err) => {
                let mut core = self.lock();
                if core.load_generation != generation {
                    debug!(episode = %episode, error = %err, "Ignoring failure of superseded load");
                    return Err(PlaybackError::Superseded);
                }

                error!(episode = %episode, error = %err, "Failed to start playback session");
                core.system = SystemState::Error;
                self.emit(&PlaybackEvent::Error {
                    message: err.to_string(),
                });
                self.reconcile(&mut core);

                return Err(PlaybackError::LoadFailed {
                    show_id: episode.show_id,
                    episode_id: episode.episode_id,
                    reason: err.to_string(),
                });
            }
        };

        let stale = {
            let mut core = self.lock();
            if core.load_generation != generation || core.shut_down {
                Some(Session::open(&info, episode.clone()))
            } else {
                debug!(
                    session_id = %info.session_id,
                    duration_secs = info.duration.as_secs_f64(),
                    start_secs = info.start_position.as_secs_f64(),
                    "Playback session opened"
                );

                core.session = Some(Session::open(&info, episode.clone()));
                core.duration = info.duration;
                core.position = info.start_position;

                match self
                    .shared
                    .engine
                    .load(&info.resource_locator, info.start_position)
                {
                    Ok(()) => {
                        core.resource_handed_over = true;
                        self.reconcile(&mut core);
                        return Ok(());
                    }
                    Err(err) => {
                        error!(episode = %episode, error = %err, "Audio engine rejected resource");
                        core.system = SystemState::Error;
                        self.emit(&PlaybackEvent::Error {
                            message: err.to_string(),
                        });
                        self.reconcile(&mut core);
                        return Err(err);
                    }
                }
            }
        };

        // A newer load or shutdown won the race; never install this session
        if let Some(session) = stale {
            debug!(session_id = %session.session_id, "Closing session of superseded load");
            let position = session.last_synced_position;
            self.close_session(session, position).await;
        }
        Err(PlaybackError::Superseded)
    }

    // ===== Seeking =====

    /// Seek to a fraction of the episode and sync immediately
    pub async fn seek_to_progress(&self, progress: f64) -> Result<()> {
        if !progress.is_finite() {
            return Err(PlaybackError::InvalidProgress(progress));
        }
        let progress = progress.clamp(0.0, 1.0);

        {
            let mut core = self.lock();
            if core.shut_down {
                return Err(PlaybackError::ShutDown);
            }
            if core.session.is_none() {
                return Err(PlaybackError::NoSession);
            }

            let target = core.duration.mul_f64(progress);
            self.shared.engine.seek(target)?;
            core.position = target;
            debug!(position_secs = target.as_secs_f64(), "Seeked");
            self.emit(&PlaybackEvent::StateChanged(core.derived()));
        }

        self.sync_progress().await;
        Ok(())
    }

    // ===== Engine events =====

    /// Feed one audio engine event into the state machine
    pub async fn handle_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::ReadyToPlay => self.on_ready(),
            EngineEvent::Started | EngineEvent::Paused => {
                let ready = {
                    let core = self.lock();
                    if core.shut_down {
                        return;
                    }
                    self.emit(&PlaybackEvent::StateChanged(core.derived()));
                    core.system == SystemState::Ready
                };
                if ready {
                    self.sync_progress().await;
                }
            }
            EngineEvent::PositionUpdate(position) => {
                let due = {
                    let mut core = self.lock();
                    if core.shut_down {
                        return;
                    }
                    core.position = position;
                    self.emit(&PlaybackEvent::StateChanged(core.derived()));

                    let interval = self.shared.config.sync_interval();
                    core.system == SystemState::Ready
                        && core
                            .session
                            .as_ref()
                            .is_some_and(|s| s.is_periodic_sync_due(position, interval))
                };
                if due {
                    self.sync_progress().await;
                }
            }
            EngineEvent::Finished => self.on_finished(),
            EngineEvent::Failed(message) => {
                let mut core = self.lock();
                if core.shut_down {
                    return;
                }
                error!(error = %message, "Audio engine failed");
                core.system = SystemState::Error;
                self.emit(&PlaybackEvent::Error { message });
                self.reconcile(&mut core);
            }
        }
    }

    fn on_ready(&self) {
        let mut core = self.lock();
        // Stale ready from a resource an earlier load handed over
        if core.shut_down || core.system != SystemState::Loading || !core.resource_handed_over {
            debug!(system = ?core.system, "Ignoring ready-to-play");
            return;
        }

        core.system = SystemState::Ready;
        // Server duration is authoritative; the engine only fills a gap
        if core.duration.is_zero() {
            let duration = self.shared.engine.duration();
            core.duration = duration;
            if let Some(session) = core.session.as_mut() {
                session.duration = duration;
            }
        }
        debug!(intent = ?core.intent, "Engine ready");
        self.reconcile(&mut core);
    }

    fn on_finished(&self) {
        let mut core = self.lock();
        if core.shut_down {
            return;
        }

        info!(episode = ?core.episode, "Episode finished");
        core.intent = UserIntent::None;
        self.emit(&PlaybackEvent::StateChanged(core.derived()));
        self.arm_auto_advance(&mut core);
    }

    // ===== Auto-advance =====

    fn arm_auto_advance(&self, core: &mut Core) {
        let token = core.auto_advance.next_token();
        let delay = self.shared.config.auto_advance_delay();
        let shared = Arc::downgrade(&self.shared);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(orchestrator) = Self::upgrade(&shared) {
                orchestrator.fire_auto_advance(token).await;
            }
        });
        core.auto_advance.arm(token, handle);
    }

    fn upgrade(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    async fn fire_auto_advance(&self, token: u64) {
        let finished = {
            let mut core = self.lock();
            if core.shut_down || !core.auto_advance.is_current(token) {
                return;
            }
            match core.episode.clone() {
                Some(finished) => finished,
                None => {
                    core.auto_advance.claim(token);
                    return;
                }
            }
        };

        // Chosen outside the state lock; a user action meanwhile voids the claim below
        let navigator = self
            .shared
            .navigator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let next = navigator.and_then(|nav| nav.next_episode(&finished));

        let (generation, previous, next) = {
            let mut core = self.lock();
            if core.shut_down || !core.auto_advance.claim(token) {
                debug!(episode = %finished, "Auto-advance cancelled while choosing next episode");
                return;
            }
            let Some((next, metadata)) = next else {
                debug!(episode = %finished, "No next episode, auto-advance stops");
                return;
            };

            info!(from = %finished, to = %next, "Auto-advancing");
            self.emit(&PlaybackEvent::EpisodeEnded(finished));
            let (generation, previous) =
                self.begin_load(&mut core, next.clone(), metadata, IntentPolicy::ForcePlay);
            (generation, previous, next)
        };

        if let Err(err) = self.finish_load(generation, previous, next).await {
            warn!(error = %err, "Auto-advance load failed");
        }
    }

    // ===== Sessions =====

    /// Immediate sync of the live session, skipped on sub-threshold jitter
    async fn sync_progress(&self) {
        let update = {
            let mut core = self.lock();
            let position = core.position;
            let min_delta = self.shared.config.min_sync_delta();
            core.session
                .as_mut()
                .and_then(|session| session.prepare_sync(position, min_delta, false))
        };

        if let Some(update) = update {
            self.push_progress(&update).await;
        }
    }

    async fn push_progress(&self, update: &ProgressUpdate) {
        debug!(
            session_id = %update.session_id,
            position_secs = update.position.as_secs_f64(),
            listened_secs = update.time_listened.as_secs_f64(),
            "Syncing progress"
        );
        // Not retried: the next sync carries a fresher position anyway
        if let Err(err) = self.shared.repository.update_progress(update).await {
            warn!(session_id = %update.session_id, error = %err, "Progress sync failed");
        }
    }

    /// Final sync, then end the session
    async fn close_session(&self, mut session: Session, position: Duration) {
        let min_delta = self.shared.config.min_sync_delta();
        if let Some(update) = session.prepare_sync(position, min_delta, true) {
            self.push_progress(&update).await;
        }

        match self
            .shared
            .repository
            .end_playback(&session.session_id)
            .await
        {
            Ok(()) => debug!(session_id = %session.session_id, "Playback session closed"),
            Err(err) => {
                warn!(session_id = %session.session_id, error = %err, "Failed to end playback session");
            }
        }
    }

    // ===== Lifecycle =====

    /// Tear down: cancel auto-advance, close the live session, end event streams
    ///
    /// Later calls are rejected or ignored. Idempotent.
    pub async fn shutdown(&self) {
        let position = {
            let mut core = self.lock();
            if core.shut_down {
                return;
            }
            core.shut_down = true;
            core.auto_advance.cancel();
            core.position
        };

        // An in-flight load finishes its transition first and sees the flag
        let _transition = self.shared.transition.lock().await;
        let live = self.lock().session.take();
        if let Some(session) = live {
            self.close_session(session, position).await;
        }
        self.shared.events.close();
        info!("Orchestrator shut down");
    }

    // ===== Internals =====

    /// Drive the engine toward the current intent, then publish
    fn reconcile(&self, core: &mut Core) {
        // While loading nothing happens now; ready re-runs this with whatever
        // intent holds by then
        if core.system == SystemState::Ready {
            let outcome = match core.intent {
                UserIntent::Play => Some(self.shared.engine.play()),
                UserIntent::Pause => Some(self.shared.engine.pause()),
                UserIntent::None => None,
            };
            if let Some(Err(err)) = outcome {
                warn!(intent = ?core.intent, error = %err, "Audio engine command failed");
            }
        }

        self.emit(&PlaybackEvent::StateChanged(core.derived()));
    }

    fn emit(&self, event: &PlaybackEvent) {
        self.shared.events.emit(event);
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.shared
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.lock();
        f.debug_struct("Orchestrator")
            .field("intent", &core.intent)
            .field("system", &core.system)
            .field("episode", &core.episode)
            .field("session", &core.session.as_ref().map(|s| &s.session_id))
            .finish()
    }
}
