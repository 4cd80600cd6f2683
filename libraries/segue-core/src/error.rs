//! Core error types for Segue

use thiserror::Error;

/// Result type alias using `SegueError`
pub type Result<T> = std::result::Result<T, SegueError>;

/// Core error type for Segue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegueError {
    /// Queue items need a location to be playable
    #[error("Item location is empty")]
    EmptyLocation,

    /// Location could not be parsed as a URI or absolute path
    #[error("Invalid item location {location:?}: {reason}")]
    InvalidLocation {
        /// Location as given by the caller
        location: String,
        /// Why it was rejected
        reason: String,
    },
}

impl SegueError {
    /// Create an invalid location error
    pub fn invalid_location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
