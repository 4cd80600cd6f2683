//! Error types for playback management
//!
//! Two kinds of failure live here:
//! - `PlaybackError`: returned to callers of the async `Player` handle
//! - `EngineFailure` -> `ErrorRecord`: engine-originated failures, mapped into
//!   a closed taxonomy, stored as the controller's last error and published

use segue_core::SegueError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The controller task has shut down
    #[error("Playback controller is no longer running")]
    ControllerClosed,

    /// Remote command text outside the supported vocabulary
    #[error("Unrecognized remote command: {0}")]
    UnknownRemoteCommand(String),

    /// Invalid item data
    #[error(transparent)]
    Core(#[from] SegueError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failure cause reported by a media engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFailure {
    /// The engine could not resolve a location for the item
    #[error("No location for item")]
    MissingLocation,

    /// Asset exists but cannot be played
    #[error("Asset is not playable: {0}")]
    NotPlayable(String),

    /// Loading the asset's tracks failed
    #[error("Failed to load asset tracks: {0}")]
    TrackLoadFailed(String),

    /// The engine's player item entered a failed state
    #[error("Player item failed: {0}")]
    ItemFailed(String),

    /// Anything else the engine reports
    #[error("{0}")]
    Other(String),
}

/// Closed set of error codes published to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unknown,
    NoUrlForItem,
    AssetNotPlayable,
    AssetTrackLoadFailed,
    PlayerItemFailed,
}

/// Most recent engine failure, as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: ErrorCode,
    pub underlying_cause: Option<String>,
}

impl ErrorRecord {
    pub fn new(code: ErrorCode, underlying_cause: Option<String>) -> Self {
        Self {
            code,
            underlying_cause,
        }
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.underlying_cause {
            Some(cause) => write!(f, "{:?}: {}", self.code, cause),
            None => write!(f, "{:?}", self.code),
        }
    }
}

/// Map an engine failure cause onto the published taxonomy
pub fn map_failure(cause: &EngineFailure) -> ErrorRecord {
    match cause {
        EngineFailure::MissingLocation => ErrorRecord::new(ErrorCode::NoUrlForItem, None),
        EngineFailure::NotPlayable(detail) => {
            ErrorRecord::new(ErrorCode::AssetNotPlayable, Some(detail.clone()))
        }
        EngineFailure::TrackLoadFailed(detail) => {
            ErrorRecord::new(ErrorCode::AssetTrackLoadFailed, Some(detail.clone()))
        }
        EngineFailure::ItemFailed(detail) => {
            ErrorRecord::new(ErrorCode::PlayerItemFailed, Some(detail.clone()))
        }
        EngineFailure::Other(detail) => ErrorRecord::new(ErrorCode::Unknown, Some(detail.clone())),
    }
}
