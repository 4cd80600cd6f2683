//! Configuration for the playback controller

use segue_core::{AutoplayRule, EndOfItemRule};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Start playing as soon as an item is ready (default: auto)
    pub autoplay_rule: AutoplayRule,

    /// Policy when an item finishes (default: play next)
    pub end_of_item_rule: EndOfItemRule,

    /// Interval between progress updates while playing (default: 500ms)
    pub progress_interval_ms: u64,

    /// Events buffered per subscriber before it starts lagging (default: 64)
    pub event_capacity: usize,
}

impl PlaybackConfig {
    /// Progress update interval, never shorter than 10ms
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(10))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay_rule: AutoplayRule::AutoPlayWhenReady,
            end_of_item_rule: EndOfItemRule::PlayNext,
            progress_interval_ms: 500,
            event_capacity: 64,
        }
    }
}
