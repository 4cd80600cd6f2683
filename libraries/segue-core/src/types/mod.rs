//! Domain types shared across the playback crates

mod item;
mod playback_state;

pub use item::{Artwork, MediaType, MetadataValue, QueueItem, UserInfo};
pub use playback_state::{AutoplayRule, EndOfItemRule, PlaybackState};
