/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid item: {0}")]
    Item(#[from] segue_core::SegueError),

    #[error("Playback error: {0}")]
    Playback(#[from] segue_playback::PlaybackError),
}
