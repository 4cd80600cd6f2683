//! Queue item value type

use crate::error::{Result, SegueError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Kind of media behind a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Audio-only stream
    Audio,
    /// Video, with or without audio
    Video,
    /// Not declared by the caller
    #[default]
    Unknown,
}

/// Typed value stored in an item's user info map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetadataValue {
    /// UTF-8 text
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Opaque binary blob
    Bytes(Vec<u8>),
}

impl MetadataValue {
    /// Borrow the text payload, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a float view of numeric values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the boolean payload, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Caller-owned metadata attached to an item
pub type UserInfo = BTreeMap<String, MetadataValue>;

/// Encoded artwork image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// MIME type of `data` when known (e.g. `image/jpeg`)
    pub mime_type: Option<String>,

    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// One playable entry in the queue
///
/// Items are immutable once built: the `with_*` methods consume the value and
/// return a new one, and the queue stores its own clone of every item it is
/// given.
///
/// Two items are equal when their location and display name match. User info,
/// artwork and media type do not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    location: Url,
    display_name: String,
    #[serde(default)]
    user_info: UserInfo,
    #[serde(default)]
    artwork: Option<Artwork>,
    #[serde(default)]
    media_type: MediaType,
}

impl QueueItem {
    /// Create an item from a URI string or an absolute file path
    ///
    /// # Returns
    /// * `Ok(item)` - Location parsed
    /// * `Err(SegueError::EmptyLocation)` - Location is blank
    /// * `Err(SegueError::InvalidLocation)` - Not a URI and not an absolute path
    pub fn new(location: &str, display_name: impl Into<String>) -> Result<Self> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(SegueError::EmptyLocation);
        }

        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) if Path::new(trimmed).is_absolute() => {
                Url::from_file_path(trimmed).map_err(|()| {
                    SegueError::invalid_location(trimmed, "not a representable file path")
                })?
            }
            Err(e) => return Err(SegueError::invalid_location(trimmed, e.to_string())),
        };

        Ok(Self::from_url(url, display_name))
    }

    /// Create an item from an already parsed URL
    pub fn from_url(location: Url, display_name: impl Into<String>) -> Self {
        Self {
            location,
            display_name: display_name.into(),
            user_info: UserInfo::new(),
            artwork: None,
            media_type: MediaType::Unknown,
        }
    }

    /// Attach a user info entry
    #[must_use]
    pub fn with_user_info(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.user_info.insert(key.into(), value.into());
        self
    }

    /// Attach artwork
    #[must_use]
    pub fn with_artwork(mut self, artwork: Artwork) -> Self {
        self.artwork = Some(artwork);
        self
    }

    /// Set the media type
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Where the asset lives
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Human readable name; may be empty
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Caller-owned metadata
    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    /// Attached artwork, if any
    pub fn artwork(&self) -> Option<&Artwork> {
        self.artwork.as_ref()
    }

    /// Declared media kind
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.display_name == other.display_name
    }
}

impl Eq for QueueItem {}

impl std::fmt::Display for QueueItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.display_name.is_empty() {
            write!(f, "{}", self.location)
        } else {
            write!(f, "{} ({})", self.display_name, self.location)
        }
    }
}
