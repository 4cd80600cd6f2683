//! Media engine seam
//!
//! The controller never talks to a decoder directly. Platforms implement
//! [`MediaEngine`] and report back through the handles they are given:
//!
//! - [`SignalSink`] for everything that happens to a loaded asset (ready,
//!   failed, stalled, reached end)
//! - [`SeekTicket`] for the completion of one seek
//!
//! Both handles carry the generation that was current when the operation was
//! issued. The controller compares it with its own generation on delivery and
//! drops anything that belongs to a superseded load.

use crate::background::GrantId;
use crate::error::EngineFailure;
use segue_core::QueueItem;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Load generation counter
pub type Generation = u64;

/// Asset event reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Asset can play (first readiness after a load, or recovery after a stall)
    Ready,
    /// Asset could not be loaded or stopped playing
    Failed(EngineFailure),
    /// Engine cannot tell the status of the asset yet
    StatusUnknown,
    /// Transport ran out of data
    Stalled,
    /// Transport reached the end of the asset
    ReachedEnd,
}

/// Input delivered to the controller's serialized processing loop
#[derive(Debug)]
pub enum Signal {
    /// Asset event tagged with the load generation it belongs to
    Engine {
        generation: Generation,
        event: EngineEvent,
    },

    /// A seek finished (or was abandoned by the engine)
    SeekFinished {
        generation: Generation,
        seek_id: u64,
        finished: bool,
    },

    /// The OS revoked a background execution grant
    GrantExpired { grant: GrantId },
}

/// Sending half of the controller's signal channel
pub type SignalSender = mpsc::UnboundedSender<Signal>;

/// Receiving half of the controller's signal channel
pub type SignalReceiver = mpsc::UnboundedReceiver<Signal>;

/// Create a signal channel for a controller
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}

/// Handle through which an engine reports events for one loaded asset
///
/// Cheap to clone and safe to use from any thread. Events sent after the
/// controller has moved on to another load are discarded on delivery.
#[derive(Debug, Clone)]
pub struct SignalSink {
    generation: Generation,
    tx: SignalSender,
}

impl SignalSink {
    pub(crate) fn new(generation: Generation, tx: SignalSender) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink reports for
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn ready(&self) {
        self.send(EngineEvent::Ready);
    }

    pub fn failed(&self, cause: EngineFailure) {
        self.send(EngineEvent::Failed(cause));
    }

    pub fn status_unknown(&self) {
        self.send(EngineEvent::StatusUnknown);
    }

    pub fn stalled(&self) {
        self.send(EngineEvent::Stalled);
    }

    pub fn reached_end(&self) {
        self.send(EngineEvent::ReachedEnd);
    }

    /// Report an arbitrary event
    pub fn send(&self, event: EngineEvent) {
        let signal = Signal::Engine {
            generation: self.generation,
            event,
        };
        if self.tx.send(signal).is_err() {
            debug!(generation = self.generation, "controller gone, engine event dropped");
        }
    }
}

/// Completion handle for a single seek
#[derive(Debug)]
pub struct SeekTicket {
    generation: Generation,
    seek_id: u64,
    tx: SignalSender,
}

impl SeekTicket {
    pub(crate) fn new(generation: Generation, seek_id: u64, tx: SignalSender) -> Self {
        Self {
            generation,
            seek_id,
            tx,
        }
    }

    pub fn seek_id(&self) -> u64 {
        self.seek_id
    }

    /// Report the seek outcome
    ///
    /// `finished = false` means the engine abandoned the seek (typically
    /// because another seek or a load replaced it).
    pub fn complete(self, finished: bool) {
        let signal = Signal::SeekFinished {
            generation: self.generation,
            seek_id: self.seek_id,
            finished,
        };
        if self.tx.send(signal).is_err() {
            debug!(seek_id = self.seek_id, "controller gone, seek completion dropped");
        }
    }
}

/// Platform media engine
///
/// Implementors wrap the real decode/render engine. Every method must return
/// promptly: loading and seeking complete asynchronously through the provided
/// sink and ticket, transport calls take effect asynchronously.
pub trait MediaEngine: Send {
    /// Begin loading `item`, replacing whatever was loaded before
    ///
    /// Readiness or failure is reported through `sink`, which the engine
    /// should keep for the asset's lifetime to report stalls and end of item.
    fn load_asset(&mut self, item: &QueueItem, sink: SignalSink);

    /// Start or resume the transport
    fn play(&mut self);

    /// Pause the transport, keeping position
    fn pause(&mut self);

    /// Halt the transport and release the loaded asset
    ///
    /// Any load in flight is abandoned.
    fn stop(&mut self);

    /// Move the play head; the outcome is reported through `ticket`
    fn seek(&mut self, position: Duration, ticket: SeekTicket);

    /// Current play head position
    fn position(&self) -> Duration;

    /// Duration of the loaded asset, if known
    fn duration(&self) -> Option<Duration>;

    /// Amount of media buffered ahead of the play head
    fn buffered_ahead(&self) -> Duration;
}

/// Controller-side wrapper around a [`MediaEngine`]
///
/// Hands out generation-tagged sinks and tickets and converts engine
/// durations into the seconds-based values the controller publishes.
pub struct EngineAdapter {
    engine: Box<dyn MediaEngine>,
    signals: SignalSender,
    next_seek_id: u64,
}

impl EngineAdapter {
    pub fn new(engine: Box<dyn MediaEngine>, signals: SignalSender) -> Self {
        Self {
            engine,
            signals,
            next_seek_id: 0,
        }
    }

    /// Load an item under `generation`
    pub fn load(&mut self, item: &QueueItem, generation: Generation) {
        let sink = SignalSink::new(generation, self.signals.clone());
        self.engine.load_asset(item, sink);
    }

    pub fn play(&mut self) {
        self.engine.play();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Issue a seek under `generation` and return its id
    pub fn seek(&mut self, position: Duration, generation: Generation) -> u64 {
        self.next_seek_id += 1;
        let ticket = SeekTicket::new(generation, self.next_seek_id, self.signals.clone());
        self.engine.seek(position, ticket);
        self.next_seek_id
    }

    /// Elapsed seconds
    pub fn elapsed(&self) -> f64 {
        self.engine.position().as_secs_f64()
    }

    /// Duration in seconds, if known
    pub fn duration(&self) -> Option<f64> {
        self.engine.duration().map(|d| d.as_secs_f64())
    }

    /// Buffered seconds ahead of the play head
    pub fn buffered(&self) -> f64 {
        self.engine.buffered_ahead().as_secs_f64()
    }
}
