//! Playback Events
//!
//! Typed notifications published by the controller. Each controller owns its
//! own [`EventBus`]; subscribers get every event published after they
//! subscribed, in publish order.

use crate::error::ErrorRecord;
use segue_core::{PlaybackState, QueueItem};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Payload key under which `error-thrown` carries its `ErrorRecord`
pub const ERROR_PAYLOAD_KEY: &str = "error";

/// Events emitted by the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PlayerEvent {
    /// Queue contents or order changed
    QueueUpdated,

    /// Controller started loading an item
    WillPlayItem { item: QueueItem },

    /// Engine finished preparing an item
    ItemReady { item: QueueItem },

    /// Item failed to load or play
    ItemFailed { item: QueueItem, error: ErrorRecord },

    /// Engine could not determine the item's status
    ItemUnknown { item: QueueItem },

    /// Periodic progress while playing
    ProgressUpdated {
        /// Elapsed seconds
        elapsed: f64,
        /// Elapsed fraction of the item, 0 when duration is unknown
        progress: f64,
    },

    /// Item played to its end
    PlaybackDidEnd { item: QueueItem },

    /// Transport ran out of data
    PlaybackStalled,

    /// Lifecycle state changed
    StateChanged {
        old: PlaybackState,
        new: PlaybackState,
    },

    /// Transport started by a play command
    DidPlay { item: QueueItem },

    /// Transport paused by a pause command
    DidPause { item: QueueItem },

    /// Transport halted by a stop command
    DidStop { item: Option<QueueItem> },

    /// An engine failure was recorded as the last error
    ErrorThrown { error: ErrorRecord },
}

impl PlayerEvent {
    /// Event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueueUpdated => "queue-updated",
            Self::WillPlayItem { .. } => "will-play-item",
            Self::ItemReady { .. } => "item-ready",
            Self::ItemFailed { .. } => "item-failed",
            Self::ItemUnknown { .. } => "item-unknown",
            Self::ProgressUpdated { .. } => "progress-updated",
            Self::PlaybackDidEnd { .. } => "playback-did-end",
            Self::PlaybackStalled => "playback-stalled",
            Self::StateChanged { .. } => "state-changed",
            Self::DidPlay { .. } => "did-play",
            Self::DidPause { .. } => "did-pause",
            Self::DidStop { .. } => "did-stop",
            Self::ErrorThrown { .. } => "error-thrown",
        }
    }
}

/// Per-controller publish/subscribe channel
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers; with none, the event is dropped
    pub fn publish(&self, event: PlayerEvent) {
        trace!(event = event.name(), "publish");
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
