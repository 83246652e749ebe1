//! Numeric episode sequencing for auto-advance

use castline_playback::{EpisodeMetadata, EpisodeNavigator, EpisodeRef};

/// Advances to the numerically next episode id within the same show
///
/// Ids are treated as decimal numbers; zero padding is kept (`"009"` is
/// followed by `"010"`). Non-numeric ids have no successor.
#[derive(Debug, Clone, Default)]
pub struct SequentialNavigator {
    last: Option<u64>,
}

impl SequentialNavigator {
    pub fn new(last: Option<u64>) -> Self {
        Self { last }
    }
}

impl EpisodeNavigator for SequentialNavigator {
    fn next_episode(&self, finished: &EpisodeRef) -> Option<(EpisodeRef, EpisodeMetadata)> {
        let current: u64 = finished.episode_id.parse().ok()?;
        let next = current.checked_add(1)?;
        if self.last.is_some_and(|last| next > last) {
            return None;
        }

        let width = finished.episode_id.len();
        let episode_id = format!("{:0width$}", next, width = width);
        Some((
            EpisodeRef::new(finished.show_id.clone(), episode_id),
            EpisodeMetadata::titled(format!("Episode {}", next)),
        ))
    }
}
