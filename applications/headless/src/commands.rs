//! Line commands read from stdin

use crate::error::{HeadlessError, Result};
use castline_playback::{DerivedPlaybackState, EpisodeMetadata, EpisodeRef, ViewCommand};
use std::fmt::Write;
use std::str::FromStr;
use std::time::Duration;

pub const HELP: &str = "\
commands:
  play                    resume or start playback
  pause                   pause playback
  seek <fraction|pct%>    jump to a point in the episode (0.5 or 50%)
  load <show> <episode>   switch episode
  status                  print the current state
  help                    show this text
  quit                    close the session and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Seek(f64),
    Load { show_id: String, episode_id: String },
    Status,
    Help,
    Quit,
}

impl Command {
    /// The orchestrator command this maps to, if any
    pub fn into_view_command(self) -> Option<ViewCommand> {
        match self {
            Command::Play => Some(ViewCommand::PlayRequest),
            Command::Pause => Some(ViewCommand::PauseRequest),
            Command::Seek(progress) => Some(ViewCommand::Seek(progress)),
            Command::Load {
                show_id,
                episode_id,
            } => {
                let metadata = EpisodeMetadata::titled(format!("Episode {}", episode_id));
                Some(ViewCommand::EpisodeChange {
                    show_id,
                    episode_id,
                    metadata,
                })
            }
            Command::Status | Command::Help | Command::Quit => None,
        }
    }
}

impl FromStr for Command {
    type Err = HeadlessError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("play" | "p", []) => Command::Play,
            ("pause", []) => Command::Pause,
            ("seek", [value]) => Command::Seek(parse_progress(value)?),
            ("load", [show, episode]) => Command::Load {
                show_id: (*show).to_string(),
                episode_id: (*episode).to_string(),
            },
            ("status" | "s", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            ("seek", _) => return Err(invalid("seek", "expected one value")),
            ("load", _) => return Err(invalid("load", "expected <show> <episode>")),
            ("play" | "p" | "pause" | "status" | "s" | "help" | "?" | "quit" | "exit" | "q", _) => {
                return Err(invalid(&name, "takes no arguments"))
            }
            _ => return Err(HeadlessError::UnknownCommand(line.trim().to_string())),
        };
        Ok(command)
    }
}

/// Accepts a fraction (`0.25`) or a percentage (`25%`)
fn parse_progress(value: &str) -> Result<f64> {
    let (number, scale) = match value.strip_suffix('%') {
        Some(percent) => (percent, 100.0),
        None => (value, 1.0),
    };
    let progress = number
        .parse::<f64>()
        .map_err(|e| invalid("seek", &e.to_string()))?
        / scale;

    if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
        return Err(invalid("seek", "position must be between 0 and 1 (or 0% and 100%)"));
    }
    Ok(progress)
}

fn invalid(command: &str, reason: &str) -> HeadlessError {
    HeadlessError::InvalidArgument {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

/// One-line summary for the `status` command
pub fn status_line(state: &DerivedPlaybackState, episode: Option<&EpisodeRef>) -> String {
    let activity = if state.has_error {
        "error"
    } else if state.is_playing {
        "playing"
    } else if state.is_loading {
        "loading"
    } else {
        "paused"
    };

    let mut line = String::from(activity);
    match episode {
        Some(episode) => {
            let _ = write!(line, " {}", episode);
        }
        None => line.push_str(" (no episode)"),
    }
    let _ = write!(
        line,
        " {} / {} ({:.0}%)",
        clock(state.position),
        clock(state.duration),
        state.progress * 100.0
    );
    if state.navigation_locked {
        line.push_str(" [navigation locked]");
    }
    line
}

/// `m:ss`, or `h:mm:ss` past the hour
fn clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
