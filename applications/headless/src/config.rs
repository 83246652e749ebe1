/// Headless player configuration
use crate::error::{HeadlessError, Result};
use castline_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "castline.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeadlessConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_engine")]
    pub engine: EngineSettings,

    #[serde(default)]
    pub autoplay: AutoplaySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub access_token: Option<String>,
}

/// Timing of the simulated engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// How often position updates are emitted while playing
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Time between `load` and the ready signal
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Length assumed until the session reports one
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AutoplaySettings {
    #[serde(default)]
    pub enabled: bool,

    /// Highest episode number auto-advance may reach
    #[serde(default)]
    pub last_episode: Option<u64>,
}

impl EngineSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }

    pub fn fallback_duration(&self) -> Duration {
        Duration::from_secs(self.fallback_duration_secs)
    }
}

impl HeadlessConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `castline.toml` in the working
    /// directory is read when present. Environment variables prefixed with
    /// `CASTLINE_` override file values, with `__` between nesting levels
    /// (e.g. `CASTLINE_SERVER__URL`, `CASTLINE_PLAYBACK__SYNC_INTERVAL_SECS`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CASTLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| HeadlessError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| HeadlessError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(HeadlessError::Config(
                "Server URL is required (set CASTLINE_SERVER__URL or --server)".to_string(),
            ));
        }

        if self.engine.tick_ms == 0 {
            return Err(HeadlessError::Config(
                "engine.tick_ms must be greater than zero".to_string(),
            ));
        }

        if self.playback.sync_interval_secs == 0 {
            return Err(HeadlessError::Config(
                "playback.sync_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            playback: PlaybackConfig::default(),
            engine: default_engine(),
            autoplay: AutoplaySettings::default(),
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        url: default_url(),
        access_token: None,
    }
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_engine() -> EngineSettings {
    EngineSettings {
        tick_ms: default_tick_ms(),
        load_delay_ms: default_load_delay_ms(),
        fallback_duration_secs: default_fallback_duration_secs(),
    }
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_load_delay_ms() -> u64 {
    250
}

fn default_fallback_duration_secs() -> u64 {
    1800
}
