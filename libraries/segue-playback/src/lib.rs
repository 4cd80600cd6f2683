//! Segue - Playback Control
//!
//! Sequential media queue playback, independent of any particular decoder.
//!
//! This crate provides:
//! - An ordered queue with a selection cursor that survives edits
//! - A playback state machine (load, play, pause, stop, seek, advance)
//! - Autoplay and end-of-item policies (play next, stop, repeat)
//! - Error mapping from engine failures into a closed set of codes
//! - Background execution grants held only while audio is playing
//! - Typed events over a per-player broadcast bus
//!
//! # Architecture
//!
//! - [`PlaybackController`] is the synchronous core. It is driven by method
//!   calls and by [`Signal`]s, and never blocks.
//! - [`Player`] runs a controller on a tokio task and exposes a cloneable
//!   handle. Everything that reaches the controller goes through that task.
//! - Platforms plug in through [`MediaEngine`] and [`BackgroundExecution`].
//!
//! Each load starts a new generation. Engine reports carry the generation
//! they belong to, so late reports about an item the player has already
//! moved past are dropped instead of corrupting the current state.
//!
//! # Example
//!
//! ```rust,no_run
//! use segue_core::QueueItem;
//! use segue_playback::{
//!     MediaEngine, PlaybackConfig, Player, SeekTicket, SignalSink, UnrestrictedBackground,
//! };
//! use std::time::Duration;
//!
//! struct MyEngine;
//!
//! impl MediaEngine for MyEngine {
//!     fn load_asset(&mut self, _item: &QueueItem, sink: SignalSink) {
//!         // Start decoding, call sink.ready() once playable
//!         sink.ready();
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek(&mut self, _position: Duration, ticket: SeekTicket) {
//!         ticket.complete(true);
//!     }
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     fn duration(&self) -> Option<Duration> { None }
//!     fn buffered_ahead(&self) -> Duration { Duration::ZERO }
//! }
//!
//! # async fn demo() -> segue_playback::Result<()> {
//! let (player, task) = Player::spawn(
//!     PlaybackConfig::default(),
//!     Box::new(MyEngine),
//!     Box::new(UnrestrictedBackground),
//! );
//! let mut events = player.subscribe();
//!
//! player.enqueue(QueueItem::new("https://example.com/a.mp3", "A")?)?;
//! player.play()?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//!
//! player.shutdown().await?;
//! task.await.ok();
//! # Ok(())
//! # }
//! ```

mod background;
mod controller;
mod engine;
mod error;
mod events;
mod player;
mod queue;
mod remote;
pub mod types;

// Public exports
pub use background::{
    BackgroundExecution, BackgroundTaskGuard, ExpirationNotice, GrantId, UnrestrictedBackground,
};
pub use controller::{PlaybackController, PlayerStatus, SeekCompletion};
pub use engine::{
    signal_channel, EngineAdapter, EngineEvent, Generation, MediaEngine, SeekTicket, Signal,
    SignalReceiver, SignalSender, SignalSink,
};
pub use error::{map_failure, EngineFailure, ErrorCode, ErrorRecord, PlaybackError, Result};
pub use events::{EventBus, PlayerEvent, ERROR_PAYLOAD_KEY};
pub use player::Player;
pub use queue::{PlaybackQueue, Removal};
pub use remote::RemoteCommand;
pub use types::PlaybackConfig;

// Shared vocabulary from segue-core
pub use segue_core::{AutoplayRule, EndOfItemRule, PlaybackState, QueueItem};
