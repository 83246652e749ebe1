//! Castline Server Client
//!
//! HTTP client for the playback endpoints of a Castline server.
//!
//! [`CastlineServerClient`] implements [`castline_playback::MediaRepository`],
//! so it can be handed straight to an [`castline_playback::Orchestrator`]:
//!
//! - **Sessions**: open a playback session for an episode and close it
//! - **Progress**: report position, duration and listening time
//!
//! # Example
//!
//! ```ignore
//! use castline_server_client::{CastlineServerClient, ServerConfig};
//! use std::sync::Arc;
//!
//! let config = ServerConfig::with_token("https://podcasts.example.com", "token");
//! let client = Arc::new(CastlineServerClient::new(config)?);
//!
//! let info = client.test_connection().await?;
//! println!("Connected to {} v{}", info.name, info.version);
//!
//! let orchestrator = Orchestrator::new(client, engine, PlaybackConfig::default());
//! ```

mod client;
mod error;
mod playback;
mod types;

pub use client::CastlineServerClient;
pub use error::{Result, ServerClientError};
pub use playback::PlaybackClient;
pub use types::{ProgressRequest, ServerConfig, ServerInfo, StartPlaybackResponse};
