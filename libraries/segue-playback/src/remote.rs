//! Remote control commands
//!
//! Lock-screen buttons, headset keys and similar external inputs arrive as a
//! small fixed vocabulary and are mapped onto ordinary controller commands.

use crate::controller::PlaybackController;
use crate::error::PlaybackError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// External transport input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "progress", rename_all = "snake_case")]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    Next,
    Previous,
    /// Jump to a fraction of the current item
    Scrub(f64),
}

impl FromStr for RemoteCommand {
    type Err = PlaybackError;

    /// Parse `play`, `pause`, `toggle`, `next`, `previous` or `scrub:<0..1>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "toggle" | "toggle_play_pause" => Ok(Self::TogglePlayPause),
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            other => other
                .strip_prefix("scrub:")
                .and_then(|value| value.parse::<f64>().ok())
                .map(Self::Scrub)
                .ok_or_else(|| PlaybackError::UnknownRemoteCommand(s.clone())),
        }
    }
}

impl PlaybackController {
    /// Apply an external transport input
    pub fn handle_remote(&mut self, command: RemoteCommand) {
        debug!(?command, "remote command");

        match command {
            RemoteCommand::Play => self.play(),
            RemoteCommand::Pause => self.pause(),
            RemoteCommand::TogglePlayPause => {
                if self.state().is_active() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            RemoteCommand::Next => {
                self.play_next_item();
            }
            RemoteCommand::Previous => {
                self.play_previous_item();
            }
            RemoteCommand::Scrub(progress) => self.seek_to_progress(progress, None),
        }
    }
}
