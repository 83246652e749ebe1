//! Main Castline server client.

use crate::error::{Result, ServerClientError};
use crate::playback::{check_status, PlaybackClient};
use crate::types::{ServerConfig, ServerInfo};
use async_trait::async_trait;
use castline_playback::{EpisodeRef, MediaRepository, PlaybackSessionInfo, ProgressUpdate};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Client for the playback API of a Castline server.
///
/// Implements [`MediaRepository`], so an `Arc<CastlineServerClient>` can be
/// passed directly to the orchestrator. Each repository call borrows a
/// [`PlaybackClient`] carrying the token current at that moment.
pub struct CastlineServerClient {
    http: Client,
    url: String,
    base_url: Url,
    access_token: RwLock<Option<String>>,
}

impl CastlineServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        let base_url =
            Url::parse(&url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Castline/{} (Headless)", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url,
            base_url,
            access_token: RwLock::new(config.access_token),
        })
    }

    /// Get the normalized server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// Replace the access token (e.g., after the user signs in again).
    pub async fn set_token(&self, access_token: impl Into<String>) {
        *self.access_token.write().await = Some(access_token.into());
    }

    /// Drop the stored token.
    pub async fn clear_token(&self) {
        *self.access_token.write().await = None;
        info!("Cleared access token");
    }

    /// Test the connection to the server.
    ///
    /// This does not require authentication.
    pub async fn test_connection(&self) -> Result<ServerInfo> {
        let url = format!("{}/api/info", self.url);
        debug!(url = %url, "Testing server connection");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;
        let response = check_status(response).await?;

        let info: ServerInfo = response.json().await.map_err(|e| {
            ServerClientError::ParseError(format!("Failed to parse server info: {}", e))
        })?;

        info!(
            name = %info.name,
            version = %info.version,
            requires_auth = info.requires_auth,
            "Connected to server"
        );
        Ok(info)
    }

    /// Borrow a playback client that authenticates with `access_token`.
    pub fn playback<'a>(&'a self, access_token: Option<&'a str>) -> PlaybackClient<'a> {
        PlaybackClient::new(&self.http, &self.base_url, access_token)
    }

    async fn current_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }
}

#[async_trait]
impl MediaRepository for CastlineServerClient {
    async fn start_playback(
        &self,
        episode: &EpisodeRef,
    ) -> castline_playback::Result<PlaybackSessionInfo> {
        let token = self.current_token().await;
        let info = self.playback(token.as_deref()).start(episode).await?;
        Ok(info)
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> castline_playback::Result<()> {
        let token = self.current_token().await;
        self.playback(token.as_deref())
            .report_progress(update)
            .await?;
        Ok(())
    }

    async fn end_playback(&self, session_id: &str) -> castline_playback::Result<()> {
        let token = self.current_token().await;
        self.playback(token.as_deref()).end(session_id).await?;
        Ok(())
    }
}
