//! Types for Castline server API requests and responses.

use crate::error::{Result, ServerClientError};
use castline_playback::{PlaybackSessionInfo, ProgressUpdate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to a Castline server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://podcasts.example.com")
    pub url: String,
    /// Bearer token sent with playback requests
    pub access_token: Option<String>,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

/// Server identity returned by `/api/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requires_auth: bool,
}

// =============================================================================
// Playback Types
// =============================================================================

/// Response from opening a playback session.
///
/// Times are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct StartPlaybackResponse {
    pub session_id: String,
    pub resource_locator: String,
    pub duration: f64,
    #[serde(default)]
    pub start_position: f64,
}

impl StartPlaybackResponse {
    pub(crate) fn into_session_info(self) -> Result<PlaybackSessionInfo> {
        Ok(PlaybackSessionInfo {
            duration: seconds("duration", self.duration)?,
            start_position: seconds("start_position", self.start_position)?,
            session_id: self.session_id,
            resource_locator: self.resource_locator,
        })
    }
}

/// Request body for a progress report. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRequest {
    pub position: f64,
    pub duration: f64,
    pub time_listened: f64,
}

impl From<&ProgressUpdate> for ProgressRequest {
    fn from(update: &ProgressUpdate) -> Self {
        Self {
            position: update.position.as_secs_f64(),
            duration: update.duration.as_secs_f64(),
            time_listened: update.time_listened.as_secs_f64(),
        }
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| ServerClientError::ParseError(format!("{} out of range: {}", field, value)))
}
