//! Playback session operations for a Castline server.

use crate::error::{Result, ServerClientError};
use crate::types::{ProgressRequest, StartPlaybackResponse};
use castline_playback::{EpisodeRef, PlaybackSessionInfo, ProgressUpdate};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

/// Playback client for a Castline server.
///
/// Borrowed from [`crate::CastlineServerClient::playback`] for one request.
pub struct PlaybackClient<'a> {
    http: &'a Client,
    base_url: &'a Url,
    access_token: Option<&'a str>,
}

impl<'a> PlaybackClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a Url, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Open a playback session for an episode.
    pub async fn start(&self, episode: &EpisodeRef) -> Result<PlaybackSessionInfo> {
        let url = self.endpoint(&[
            "api",
            "shows",
            &episode.show_id,
            "episodes",
            &episode.episode_id,
            "playback",
        ])?;
        debug!(url = %url, episode = %episode, "Starting playback session");

        let response = self.send(self.http.post(url)).await?;
        let body: StartPlaybackResponse = response.json().await.map_err(|e| {
            ServerClientError::ParseError(format!("Failed to parse playback session: {}", e))
        })?;
        let info = body.into_session_info()?;

        debug!(
            session_id = %info.session_id,
            duration_secs = info.duration.as_secs_f64(),
            "Opened playback session"
        );
        Ok(info)
    }

    /// Report progress for an open session.
    pub async fn report_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let url = self.endpoint(&["api", "playback", &update.session_id, "progress"])?;
        let body = ProgressRequest::from(update);
        debug!(
            session_id = %update.session_id,
            position_secs = body.position,
            listened_secs = body.time_listened,
            "Reporting progress"
        );

        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    /// Close a playback session.
    pub async fn end(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "playback", session_id])?;
        debug!(session_id = %session_id, "Ending playback session");

        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServerClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(ServerClientError::from_send)?;
        check_status(response).await
    }
}

/// Map a non-success response onto the client error taxonomy.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else if status.as_u16() == 401 {
        Err(ServerClientError::AuthRequired)
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(ServerClientError::ServerError {
            status: status.as_u16(),
            message: error_text,
        })
    }
}
