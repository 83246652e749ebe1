/// Headless player error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeadlessError>;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for `{command}`: {reason}")]
    InvalidArgument { command: String, reason: String },

    #[error(transparent)]
    Playback(#[from] castline_playback::PlaybackError),

    #[error(transparent)]
    Server(#[from] castline_server_client::ServerClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
