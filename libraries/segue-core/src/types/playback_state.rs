//! Playback lifecycle and policy types

use serde::{Deserialize, Serialize};

/// Lifecycle state of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded yet, or the controller was torn down
    #[default]
    Unknown,
    /// Waiting for the engine to prepare the current item
    Loading,
    /// Item prepared, transport not running
    Ready,
    /// Transport running
    Playing,
    /// Transport halted by request; position kept
    Paused,
    /// Caller is scrubbing; progress updates are suppressed
    Seeking,
    /// Transport running but starved for data
    Buffering,
    /// Transport halted by request; queue position kept
    Stopped,
    /// Queue ran out
    Done,
    /// Current item failed to load or play
    Error,
}

impl PlaybackState {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Seeking => "seeking",
            Self::Buffering => "buffering",
            Self::Stopped => "stopped",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// States in which the transport consumes resources and a background
    /// execution grant is held
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }

    /// States in which the engine holds (or is preparing) the current item
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            Self::Loading
                | Self::Ready
                | Self::Playing
                | Self::Paused
                | Self::Seeking
                | Self::Buffering
        )
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether playback starts once an item becomes ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoplayRule {
    /// Start the transport as soon as the item is ready
    #[default]
    #[serde(rename = "auto")]
    AutoPlayWhenReady,
    /// Wait for an explicit `play()`
    #[serde(rename = "manual")]
    ManualPlayWhenReady,
}

impl AutoplayRule {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoPlayWhenReady => "auto",
            Self::ManualPlayWhenReady => "manual",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::AutoPlayWhenReady),
            "manual" => Some(Self::ManualPlayWhenReady),
            _ => None,
        }
    }
}

/// What happens when the current item finishes naturally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfItemRule {
    /// Advance to the next item
    #[default]
    PlayNext,
    /// Halt after the current item
    Stop,
    /// Replay the current item; explicit advancing wraps around the queue
    Repeat,
}

impl EndOfItemRule {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayNext => "play_next",
            Self::Stop => "stop",
            Self::Repeat => "repeat",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "play_next" => Some(Self::PlayNext),
            "stop" => Some(Self::Stop),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }
}

impl std::fmt::Display for EndOfItemRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
