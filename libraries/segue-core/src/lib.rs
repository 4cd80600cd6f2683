//! Segue Core
//!
//! Platform-agnostic value types and error handling shared by the Segue
//! playback crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `QueueItem`, `MediaType`, `MetadataValue`, `Artwork`
//! - **Playback Vocabulary**: `PlaybackState`, `AutoplayRule`, `EndOfItemRule`
//! - **Error Handling**: `SegueError` and `Result`
//! - **Formatting**: `format_time` for elapsed/remaining labels
//!
//! # Example
//!
//! ```rust
//! use segue_core::{format_time, MediaType, QueueItem};
//!
//! let item = QueueItem::new("https://example.com/episode-12.mp3", "Episode 12")
//!     .unwrap()
//!     .with_media_type(MediaType::Audio)
//!     .with_user_info("episode", 12_i64);
//!
//! assert_eq!(item.display_name(), "Episode 12");
//! assert_eq!(format_time(65.0), "1:05");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SegueError};
pub use time::{format_duration, format_time};
pub use types::{
    Artwork, AutoplayRule, EndOfItemRule, MediaType, MetadataValue, PlaybackState, QueueItem,
    UserInfo,
};
