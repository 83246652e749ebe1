//! Shared mocks for orchestrator integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use castline_playback::{
    AudioEngine, EpisodeMetadata, EpisodeNavigator, EpisodeRef, IntentPolicy, MediaRepository,
    Orchestrator, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackSessionInfo,
    ProgressUpdate, Result,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const EPISODE_SECS: u64 = 1200;

// ============================================================================
// REPOSITORY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    Start(EpisodeRef),
    Progress(ProgressUpdate),
    End(String),
}

pub struct MockRepository {
    calls: Mutex<Vec<RepoCall>>,
    next_session: AtomicUsize,
    latency: Mutex<Duration>,
    end_latency: Mutex<Duration>,
    latency_by_episode: Mutex<HashMap<String, Duration>>,
    failing_episodes: Mutex<HashSet<String>>,
    fail_progress: Mutex<bool>,
    duration: Mutex<Duration>,
    start_position: Mutex<Duration>,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_session: AtomicUsize::new(1),
            latency: Mutex::new(Duration::ZERO),
            end_latency: Mutex::new(Duration::ZERO),
            latency_by_episode: Mutex::new(HashMap::new()),
            failing_episodes: Mutex::new(HashSet::new()),
            fail_progress: Mutex::new(false),
            duration: Mutex::new(Duration::from_secs(EPISODE_SECS)),
            start_position: Mutex::new(Duration::ZERO),
        }
    }
}

impl MockRepository {
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_end_latency(&self, latency: Duration) {
        *self.end_latency.lock().unwrap() = latency;
    }

    pub fn set_episode_latency(&self, episode_id: &str, latency: Duration) {
        self.latency_by_episode
            .lock()
            .unwrap()
            .insert(episode_id.to_string(), latency);
    }

    pub fn fail_episode(&self, episode_id: &str) {
        self.failing_episodes
            .lock()
            .unwrap()
            .insert(episode_id.to_string());
    }

    pub fn heal_episode(&self, episode_id: &str) {
        self.failing_episodes.lock().unwrap().remove(episode_id);
    }

    pub fn set_fail_progress(&self, fail: bool) {
        *self.fail_progress.lock().unwrap() = fail;
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock().unwrap() = duration;
    }

    pub fn set_start_position(&self, position: Duration) {
        *self.start_position.lock().unwrap() = position;
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn progress_updates(&self) -> Vec<ProgressUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RepoCall::Progress(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    pub fn started_sessions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RepoCall::Start(_)))
            .count()
    }

    pub fn ended_sessions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RepoCall::End(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Most remote sessions open at once, counting a start as opening
    /// and an end as closing
    pub fn max_open_sessions(&self) -> usize {
        let mut open = 0usize;
        let mut max = 0;
        for call in self.calls() {
            match call {
                RepoCall::Start(_) => {
                    open += 1;
                    max = max.max(open);
                }
                RepoCall::End(_) => open = open.saturating_sub(1),
                RepoCall::Progress(_) => {}
            }
        }
        max
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: RepoCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaRepository for MockRepository {
    async fn start_playback(&self, episode: &EpisodeRef) -> Result<PlaybackSessionInfo> {
        self.record(RepoCall::Start(episode.clone()));
        // Reserve the id before suspending so ids follow call order
        let session = self.next_session.fetch_add(1, Ordering::SeqCst);

        let latency = self
            .latency_by_episode
            .lock()
            .unwrap()
            .get(&episode.episode_id)
            .copied()
            .unwrap_or(*self.latency.lock().unwrap());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self
            .failing_episodes
            .lock()
            .unwrap()
            .contains(&episode.episode_id)
        {
            return Err(PlaybackError::repository("service unavailable"));
        }

        Ok(PlaybackSessionInfo {
            session_id: format!("session-{}", session),
            resource_locator: format!("https://cdn.example.com/{}.mp3", episode.episode_id),
            duration: *self.duration.lock().unwrap(),
            start_position: *self.start_position.lock().unwrap(),
        })
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<()> {
        self.record(RepoCall::Progress(update.clone()));
        if *self.fail_progress.lock().unwrap() {
            return Err(PlaybackError::repository("progress endpoint down"));
        }
        Ok(())
    }

    async fn end_playback(&self, session_id: &str) -> Result<()> {
        let latency = *self.end_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        // Recorded once the server has let go of the session
        self.record(RepoCall::End(session_id.to_string()));
        Ok(())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String, Duration),
    Play,
    Pause,
    Seek(Duration),
}

pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    duration: Mutex<Duration>,
    reject_load: Mutex<bool>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            duration: Mutex::new(Duration::from_secs(EPISODE_SECS)),
            reject_load: Mutex::new(false),
        }
    }
}

impl MockEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn play_count(&self) -> usize {
        self.count(&EngineCall::Play)
    }

    pub fn pause_count(&self) -> usize {
        self.count(&EngineCall::Pause)
    }

    pub fn last_transport_call(&self) -> Option<EngineCall> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| matches!(call, EngineCall::Play | EngineCall::Pause))
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock().unwrap() = duration;
    }

    pub fn set_reject_load(&self, reject: bool) {
        *self.reject_load.lock().unwrap() = reject;
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioEngine for MockEngine {
    fn load(&self, resource_locator: &str, start_position: Duration) -> Result<()> {
        if *self.reject_load.lock().unwrap() {
            return Err(PlaybackError::engine("unsupported codec"));
        }
        self.record(EngineCall::Load(resource_locator.to_string(), start_position));
        Ok(())
    }

    fn play(&self) -> Result<()> {
        self.record(EngineCall::Play);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    fn seek(&self, position: Duration) -> Result<()> {
        self.record(EngineCall::Seek(position));
        Ok(())
    }

    fn position(&self) -> Duration {
        Duration::ZERO
    }

    fn duration(&self) -> Duration {
        *self.duration.lock().unwrap()
    }
}

// ============================================================================
// NAVIGATOR
// ============================================================================

/// Advances to `episode_id + 1` up to `last`
pub struct CountingNavigator {
    pub last: u32,
}

impl EpisodeNavigator for CountingNavigator {
    fn next_episode(&self, finished: &EpisodeRef) -> Option<(EpisodeRef, EpisodeMetadata)> {
        let current: u32 = finished.episode_id.parse().ok()?;
        if current >= self.last {
            return None;
        }
        let next = (current + 1).to_string();
        Some((
            EpisodeRef::new(finished.show_id.clone(), next.clone()),
            EpisodeMetadata::titled(format!("Episode {}", next)),
        ))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub repository: Arc<MockRepository>,
    pub engine: Arc<MockEngine>,
    pub events: UnboundedReceiver<PlaybackEvent>,
}

pub fn harness() -> Harness {
    harness_with_config(PlaybackConfig::default())
}

pub fn harness_with_config(config: PlaybackConfig) -> Harness {
    let repository = Arc::new(MockRepository::default());
    let engine = Arc::new(MockEngine::default());
    let orchestrator = Orchestrator::new(repository.clone(), engine.clone(), config);
    let events = orchestrator.subscribe();
    Harness {
        orchestrator,
        repository,
        engine,
        events,
    }
}

pub fn episode(id: &str) -> EpisodeRef {
    EpisodeRef::new("show-1", id)
}

pub fn metadata(id: &str) -> EpisodeMetadata {
    EpisodeMetadata::titled(format!("Episode {}", id))
}

/// Load an episode and let the engine report ready
pub async fn load_ready(orchestrator: &Orchestrator, id: &str, policy: IntentPolicy) {
    orchestrator
        .load_episode(episode(id), metadata(id), policy)
        .await
        .expect("load should succeed");
    orchestrator
        .handle_engine_event(castline_playback::EngineEvent::ReadyToPlay)
        .await;
}

pub fn drain(events: &mut UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn ended_events(events: &[PlaybackEvent]) -> Vec<EpisodeRef> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::EpisodeEnded(episode) => Some(episode.clone()),
            _ => None,
        })
        .collect()
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
