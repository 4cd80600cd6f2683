//! Playback controller - core state machine
//!
//! Owns the queue, drives the media engine and the background grant, and
//! publishes events. All methods take `&mut self`; the [`Player`] actor is
//! what serializes commands from callers with signals from the engine.
//!
//! Every load bumps the generation counter, and so do `stop()` and
//! teardown. Engine signals and seek completions carry the generation they
//! were issued under and are dropped on delivery if it no longer matches.
//!
//! [`Player`]: crate::player::Player

use crate::{
    background::{BackgroundExecution, BackgroundTaskGuard},
    engine::{EngineAdapter, EngineEvent, Generation, MediaEngine, Signal, SignalSender},
    error::{map_failure, EngineFailure, ErrorRecord},
    events::{EventBus, PlayerEvent},
    queue::{PlaybackQueue, Removal},
    types::PlaybackConfig,
};
use segue_core::{AutoplayRule, EndOfItemRule, PlaybackState, QueueItem};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Receives `true` when a seek landed, `false` if it was superseded,
/// cancelled or could not be issued
pub type SeekCompletion = oneshot::Sender<bool>;

/// Past this many seconds, "previous" restarts the current item instead
const RESTART_THRESHOLD_SECS: f64 = 3.0;

/// Seek issued to the engine and not yet completed
struct PendingSeek {
    id: u64,
    completion: Option<SeekCompletion>,
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub current_index: Option<usize>,
    pub current_item: Option<QueueItem>,
    /// Elapsed seconds in the current item
    pub elapsed: f64,
    /// Duration of the current item in seconds, if known
    pub duration: Option<f64>,
    /// Normalized progress in `[0, 1]`
    pub progress: f64,
    /// Seconds buffered ahead of the play head
    pub loaded: f64,
    pub last_error: Option<ErrorRecord>,
    pub generation: Generation,
    pub autoplay_rule: AutoplayRule,
    pub end_of_item_rule: EndOfItemRule,
    pub queue_len: usize,
    pub background_held: bool,
}

/// Queue-driven playback state machine
pub struct PlaybackController {
    // State
    state: PlaybackState,
    generation: Generation,
    last_error: Option<ErrorRecord>,

    // Queue and settings
    queue: PlaybackQueue,
    config: PlaybackConfig,

    // Collaborators
    engine: EngineAdapter,
    background: BackgroundTaskGuard,
    events: EventBus,

    // Engine holds a prepared asset for the current item
    asset_ready: bool,
    // Start transport on the next ready regardless of the autoplay rule
    play_when_ready: bool,
    // State to restore when seeking ends
    pre_seek_state: Option<PlaybackState>,
    pending_seek: Option<PendingSeek>,
    // Failures since the last successful load, bounds automatic skipping
    consecutive_failures: usize,
}

impl PlaybackController {
    /// Create a controller
    ///
    /// `signals` must be the sending half of the channel whose receiver feeds
    /// [`handle_signal`](Self::handle_signal).
    pub fn new(
        config: PlaybackConfig,
        engine: Box<dyn MediaEngine>,
        background: Box<dyn BackgroundExecution>,
        events: EventBus,
        signals: SignalSender,
    ) -> Self {
        Self {
            state: PlaybackState::Unknown,
            generation: 0,
            last_error: None,
            queue: PlaybackQueue::new(),
            config,
            engine: EngineAdapter::new(engine, signals.clone()),
            background: BackgroundTaskGuard::new(background, signals),
            events,
            asset_ready: false,
            play_when_ready: false,
            pre_seek_state: None,
            pending_seek: None,
            consecutive_failures: 0,
        }
    }

    // ===== Queue Management =====

    /// Append an item to the queue
    pub fn enqueue(&mut self, item: QueueItem) {
        self.queue.enqueue(item);
        self.events.publish(PlayerEvent::QueueUpdated);
    }

    /// Insert an item, clamping `index` into `[0, len]`
    pub fn insert(&mut self, item: QueueItem, index: usize) {
        self.queue.insert(item, index);
        self.events.publish(PlayerEvent::QueueUpdated);
    }

    /// Remove the entry at `index`; out-of-range indices are ignored
    pub fn dequeue_at(&mut self, index: usize) -> Option<QueueItem> {
        let removal = self.queue.dequeue_at(index)?;
        Some(self.after_removal(removal))
    }

    /// Remove the first entry equal to `item`
    pub fn dequeue_by_value(&mut self, item: &QueueItem) -> Option<QueueItem> {
        let removal = self.queue.dequeue_by_value(item)?;
        Some(self.after_removal(removal))
    }

    /// Move an entry; the selection follows its item
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let moved = self.queue.move_item(from, to);
        if moved && from != to {
            self.events.publish(PlayerEvent::QueueUpdated);
        }
        moved
    }

    /// Stop playback and empty the queue
    pub fn clear(&mut self) {
        if self.state.is_engaged() || self.state == PlaybackState::Error {
            self.stop();
        }
        self.queue.clear();
        self.consecutive_failures = 0;
        self.events.publish(PlayerEvent::QueueUpdated);
    }

    /// Ordered copy of the queue
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.queue.snapshot()
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    fn after_removal(&mut self, removal: Removal) -> QueueItem {
        self.events.publish(PlayerEvent::QueueUpdated);

        if removal.was_current && self.state.is_engaged() {
            debug!(index = removal.index, "selected item removed during playback");
            self.halt_transport();
            self.consecutive_failures = 0;
            let exhausted = self.exhausted_state();
            self.advance(exhausted, false);
        }

        removal.item
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// With nothing loaded, loads the selected item (or the head of the
    /// queue) and plays it once ready, whatever the autoplay rule says.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Ready | PlaybackState::Paused => self.start_transport(),
            PlaybackState::Unknown
            | PlaybackState::Stopped
            | PlaybackState::Done
            | PlaybackState::Error => {
                if self.queue.current_index().is_none() && !self.queue.select(0) {
                    debug!("play requested with an empty queue");
                    return;
                }
                self.consecutive_failures = 0;
                self.load_current(true);
            }
            PlaybackState::Loading => self.play_when_ready = true,
            PlaybackState::Seeking => self.pre_seek_state = Some(PlaybackState::Playing),
            PlaybackState::Playing | PlaybackState::Buffering => {}
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Buffering => {
                self.engine.pause();
                self.set_state(PlaybackState::Paused);
                if let Some(item) = self.queue.current().cloned() {
                    self.events.publish(PlayerEvent::DidPause { item });
                }
            }
            PlaybackState::Seeking => {
                self.engine.pause();
                self.pre_seek_state = Some(PlaybackState::Paused);
            }
            PlaybackState::Loading => self.play_when_ready = false,
            _ => {}
        }
    }

    /// Stop playback
    ///
    /// Halts the transport and releases the background grant. The queue and
    /// the selection are kept, so `play()` restarts the selected item from
    /// the beginning.
    pub fn stop(&mut self) {
        if matches!(self.state, PlaybackState::Unknown | PlaybackState::Stopped) {
            return;
        }
        self.finish(PlaybackState::Stopped);
    }

    /// Advance to the next item
    ///
    /// Returns `false` when the queue is exhausted: the controller then ends
    /// up `Stopped` under the stop rule and `Done` otherwise. Under the repeat
    /// rule the queue wraps around.
    pub fn play_next_item(&mut self) -> bool {
        self.consecutive_failures = 0;
        let exhausted = self.exhausted_state();
        self.advance(exhausted, false)
    }

    /// Reload the selected item from scratch
    pub fn play_current_item(&mut self) -> bool {
        if self.queue.current_index().is_none() {
            return false;
        }
        self.consecutive_failures = 0;
        self.load_current(false)
    }

    /// Go back one item, or restart the current one if it has been playing
    /// for a while (or is the head of the queue)
    pub fn play_previous_item(&mut self) -> bool {
        self.consecutive_failures = 0;
        if self.asset_ready && self.current_item_progress() > RESTART_THRESHOLD_SECS {
            self.restart_current();
            return true;
        }

        match self.queue.previous_index() {
            Some(index) => {
                self.queue.select(index);
                self.load_current(false)
            }
            None if self.asset_ready => {
                self.restart_current();
                true
            }
            None => self.play_current_item(),
        }
    }

    // ===== Seeking =====

    /// Enter scrubbing mode, remembering the state to return to
    pub fn begin_seeking(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ready
        ) {
            self.pre_seek_state = Some(self.state);
            self.set_state(PlaybackState::Seeking);
        }
    }

    /// Seek to a fraction of the current item
    ///
    /// `progress` is clamped into `[0, 1]`. A seek issued before the previous
    /// one completed supersedes it; the superseded completion receives
    /// `false`. Without a loaded item of known duration the completion
    /// receives `false` immediately.
    pub fn seek_to_progress(&mut self, progress: f64, completion: Option<SeekCompletion>) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let seekable = self.asset_ready
            && matches!(
                self.state,
                PlaybackState::Seeking
                    | PlaybackState::Playing
                    | PlaybackState::Paused
                    | PlaybackState::Ready
                    | PlaybackState::Buffering
            );
        let duration = self
            .engine
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0);

        let Some(duration) = duration.filter(|_| seekable) else {
            debug!(state = %self.state, "seek ignored, nothing seekable loaded");
            resolve(completion, false);
            return;
        };

        self.resolve_pending_seek(false);
        let position = Duration::from_secs_f64(duration * progress);
        let id = self.engine.seek(position, self.generation);
        debug!(seek_id = id, ?position, "seek issued");
        self.pending_seek = Some(PendingSeek { id, completion });
    }

    /// Leave scrubbing mode and restore the remembered state
    pub fn end_seeking(&mut self) {
        if self.state != PlaybackState::Seeking {
            return;
        }

        match self.pre_seek_state.take().unwrap_or(PlaybackState::Paused) {
            PlaybackState::Playing => {
                self.engine.play();
                self.set_state(PlaybackState::Playing);
            }
            restored => self.set_state(restored),
        }
        self.publish_progress();
    }

    // ===== Settings =====

    pub fn autoplay_rule(&self) -> AutoplayRule {
        self.config.autoplay_rule
    }

    pub fn set_autoplay_rule(&mut self, rule: AutoplayRule) {
        self.config.autoplay_rule = rule;
    }

    pub fn end_of_item_rule(&self) -> EndOfItemRule {
        self.config.end_of_item_rule
    }

    pub fn set_end_of_item_rule(&mut self, rule: EndOfItemRule) {
        self.config.end_of_item_rule = rule;
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Lifecycle =====

    /// Release engine resources and the background grant
    ///
    /// The state returns to `Unknown`; the queue and selection are kept.
    pub fn destroy_player(&mut self) {
        info!(generation = self.generation, "tearing down player");
        self.halt_transport();
        self.background.release();
        self.play_when_ready = false;
        self.consecutive_failures = 0;
        self.set_state(PlaybackState::Unknown);
    }

    // ===== Signals =====

    /// Process one asynchronous signal from the engine or the OS
    pub fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Engine { generation, event } => {
                if generation != self.generation {
                    debug!(
                        generation,
                        current = self.generation,
                        ?event,
                        "discarding stale engine event"
                    );
                    return;
                }
                self.handle_engine_event(event);
            }
            Signal::SeekFinished {
                generation,
                seek_id,
                finished,
            } => self.on_seek_finished(generation, seek_id, finished),
            Signal::GrantExpired { grant } => {
                if self.background.expire(grant) {
                    self.pause();
                }
            }
        }
    }

    /// Publish a progress update if the transport is running
    ///
    /// Driven by the periodic timer of the owning task.
    pub fn tick(&mut self) {
        if self.state.is_active() {
            self.publish_progress();
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => self.on_ready(),
            EngineEvent::Failed(cause) => self.on_failed(cause),
            EngineEvent::StatusUnknown => {
                if let Some(item) = self.queue.current().cloned() {
                    self.events.publish(PlayerEvent::ItemUnknown { item });
                }
            }
            EngineEvent::Stalled => {
                if self.state.is_active() {
                    self.events.publish(PlayerEvent::PlaybackStalled);
                    self.set_state(PlaybackState::Buffering);
                }
            }
            EngineEvent::ReachedEnd => self.on_reached_end(),
        }
    }

    fn on_ready(&mut self) {
        match self.state {
            PlaybackState::Loading => {
                self.asset_ready = true;
                self.consecutive_failures = 0;
                if let Some(item) = self.queue.current().cloned() {
                    self.events.publish(PlayerEvent::ItemReady { item });
                }
                self.set_state(PlaybackState::Ready);

                if self.config.autoplay_rule == AutoplayRule::AutoPlayWhenReady
                    || self.play_when_ready
                {
                    self.start_transport();
                }
            }
            PlaybackState::Buffering => {
                self.engine.play();
                self.set_state(PlaybackState::Playing);
            }
            state => debug!(%state, "ready ignored"),
        }
    }

    fn on_failed(&mut self, cause: EngineFailure) {
        if !self.state.is_engaged() {
            debug!(state = %self.state, %cause, "failure ignored");
            return;
        }

        let record = map_failure(&cause);
        warn!(error = %record, "item failed");
        self.last_error = Some(record.clone());
        self.resolve_pending_seek(false);
        self.pre_seek_state = None;
        self.asset_ready = false;
        self.set_state(PlaybackState::Error);

        if let Some(item) = self.queue.current().cloned() {
            self.events.publish(PlayerEvent::ItemFailed {
                item,
                error: record.clone(),
            });
        }
        self.events.publish(PlayerEvent::ErrorThrown { error: record });

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.queue.len() {
            warn!(failures = self.consecutive_failures, "no playable item left in queue");
            self.finish(PlaybackState::Stopped);
            return;
        }

        let keep_playing = self.play_when_ready;
        self.advance(PlaybackState::Stopped, keep_playing);
    }

    fn on_reached_end(&mut self) {
        if !self.state.is_active() {
            debug!(state = %self.state, "end of item ignored");
            return;
        }

        if let Some(item) = self.queue.current().cloned() {
            self.events.publish(PlayerEvent::PlaybackDidEnd { item });
        }

        match self.config.end_of_item_rule {
            EndOfItemRule::PlayNext => {
                self.advance(PlaybackState::Done, false);
            }
            EndOfItemRule::Stop => self.finish(PlaybackState::Stopped),
            EndOfItemRule::Repeat => {
                self.restart_current();
                self.engine.play();
                self.set_state(PlaybackState::Playing);
            }
        }
    }

    fn on_seek_finished(&mut self, generation: Generation, seek_id: u64, finished: bool) {
        let current = generation == self.generation
            && self.pending_seek.as_ref().map(|seek| seek.id) == Some(seek_id);
        if !current {
            debug!(seek_id, "ignoring superseded seek completion");
            return;
        }

        if let Some(seek) = self.pending_seek.take() {
            resolve(seek.completion, finished);
        }
        if finished && self.state != PlaybackState::Seeking {
            self.publish_progress();
        }
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_loading(&self) -> bool {
        self.state == PlaybackState::Loading
    }

    /// Selected queue entry
    pub fn currently_playing_item(&self) -> Option<&QueueItem> {
        self.queue.current()
    }

    /// Elapsed seconds, 0 when nothing is loaded
    pub fn current_item_progress(&self) -> f64 {
        if self.asset_ready {
            self.engine.elapsed()
        } else {
            0.0
        }
    }

    /// Seconds buffered ahead of the play head
    pub fn loaded_progress(&self) -> f64 {
        if self.asset_ready {
            self.engine.buffered()
        } else {
            0.0
        }
    }

    /// Duration of the loaded item in seconds
    pub fn current_item_duration(&self) -> Option<f64> {
        if self.asset_ready {
            self.engine.duration()
        } else {
            None
        }
    }

    /// Elapsed fraction of the loaded item, 0 when the duration is unknown
    pub fn progress(&self) -> f64 {
        match self.current_item_duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                (self.current_item_progress() / duration).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn last_error(&self) -> Option<&ErrorRecord> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn background_held(&self) -> bool {
        self.background.is_held()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state,
            current_index: self.queue.current_index(),
            current_item: self.queue.current().cloned(),
            elapsed: self.current_item_progress(),
            duration: self.current_item_duration(),
            progress: self.progress(),
            loaded: self.loaded_progress(),
            last_error: self.last_error.clone(),
            generation: self.generation,
            autoplay_rule: self.config.autoplay_rule,
            end_of_item_rule: self.config.end_of_item_rule,
            queue_len: self.queue.len(),
            background_held: self.background.is_held(),
        }
    }

    // ===== Internals =====

    /// State reached when advancing past the tail of the queue
    fn exhausted_state(&self) -> PlaybackState {
        match self.config.end_of_item_rule {
            EndOfItemRule::Stop => PlaybackState::Stopped,
            EndOfItemRule::PlayNext | EndOfItemRule::Repeat => PlaybackState::Done,
        }
    }

    fn advance(&mut self, exhausted: PlaybackState, play_when_ready: bool) -> bool {
        let wrap = self.config.end_of_item_rule == EndOfItemRule::Repeat;

        match self.queue.next_index(wrap) {
            Some(index) => {
                self.queue.select(index);
                self.load_current(play_when_ready)
            }
            None => {
                debug!(state = %exhausted, "queue exhausted");
                self.finish(exhausted);
                false
            }
        }
    }

    fn load_current(&mut self, play_when_ready: bool) -> bool {
        let Some(item) = self.queue.current().cloned() else {
            return false;
        };

        self.generation += 1;
        self.resolve_pending_seek(false);
        self.pre_seek_state = None;
        self.asset_ready = false;
        self.play_when_ready = play_when_ready;

        debug!(generation = self.generation, item = %item, "loading item");
        self.events.publish(PlayerEvent::WillPlayItem { item: item.clone() });
        self.set_state(PlaybackState::Loading);
        self.engine.load(&item, self.generation);
        true
    }

    fn start_transport(&mut self) {
        self.play_when_ready = false;
        self.engine.play();
        self.set_state(PlaybackState::Playing);
        if let Some(item) = self.queue.current().cloned() {
            self.events.publish(PlayerEvent::DidPlay { item });
        }
    }

    /// Cancel in-flight work and tear down the engine transport
    fn halt_transport(&mut self) {
        self.generation += 1;
        self.resolve_pending_seek(false);
        self.pre_seek_state = None;
        self.asset_ready = false;
        self.engine.stop();
    }

    /// Halt and settle in a terminal state (`Stopped` or `Done`)
    fn finish(&mut self, state: PlaybackState) {
        self.halt_transport();
        self.play_when_ready = false;
        self.consecutive_failures = 0;
        self.set_state(state);

        if state == PlaybackState::Stopped {
            let item = self.queue.current().cloned();
            self.events.publish(PlayerEvent::DidStop { item });
        }
    }

    fn restart_current(&mut self) {
        self.resolve_pending_seek(false);
        self.engine.seek(Duration::ZERO, self.generation);
    }

    fn resolve_pending_seek(&mut self, finished: bool) {
        if let Some(seek) = self.pending_seek.take() {
            resolve(seek.completion, finished);
        }
    }

    fn publish_progress(&self) {
        self.events.publish(PlayerEvent::ProgressUpdated {
            elapsed: self.current_item_progress(),
            progress: self.progress(),
        });
    }

    fn set_state(&mut self, new: PlaybackState) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        debug!(%old, %new, "playback state changed");

        if new.is_active() && !old.is_active() {
            self.background.acquire();
        } else if matches!(
            new,
            PlaybackState::Paused
                | PlaybackState::Stopped
                | PlaybackState::Done
                | PlaybackState::Error
        ) {
            self.background.release();
        }

        self.events.publish(PlayerEvent::StateChanged { old, new });
    }
}

fn resolve(completion: Option<SeekCompletion>, finished: bool) {
    if let Some(tx) = completion {
        let _ = tx.send(finished);
    }
}
