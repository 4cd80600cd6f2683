//! Async player handle
//!
//! [`Player`] runs a [`PlaybackController`] on its own tokio task. Commands
//! from any number of cloned handles, signals from the engine and the OS, and
//! the progress timer are all funneled into that one task, so the controller
//! only ever sees one input at a time.

use crate::{
    background::BackgroundExecution,
    controller::{PlaybackController, PlayerStatus, SeekCompletion},
    engine::{signal_channel, MediaEngine, SignalReceiver},
    error::{PlaybackError, Result},
    events::{EventBus, PlayerEvent},
    remote::RemoteCommand,
    types::PlaybackConfig,
};
use segue_core::{AutoplayRule, EndOfItemRule, QueueItem};
use std::time::Duration;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info};

/// Commands sent to the player task
#[derive(Debug)]
enum Command {
    Enqueue(QueueItem),
    Insert { item: QueueItem, index: usize },
    DequeueAt(usize),
    DequeueItem(QueueItem),
    MoveItem { from: usize, to: usize },
    Clear,

    Play,
    Pause,
    Stop,
    PlayNext(oneshot::Sender<bool>),
    PlayCurrent(oneshot::Sender<bool>),
    PlayPrevious(oneshot::Sender<bool>),

    BeginSeeking,
    SeekToProgress {
        progress: f64,
        completion: Option<SeekCompletion>,
    },
    EndSeeking,

    SetAutoplayRule(AutoplayRule),
    SetEndOfItemRule(EndOfItemRule),
    Remote(RemoteCommand),

    Status(oneshot::Sender<PlayerStatus>),
    Snapshot(oneshot::Sender<Vec<QueueItem>>),

    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running player task
#[derive(Clone)]
pub struct Player {
    commands: mpsc::UnboundedSender<Command>,
    events: EventBus,
}

impl Player {
    /// Start a player task on the current tokio runtime
    ///
    /// The task runs until [`shutdown`](Self::shutdown) is called or every
    /// handle has been dropped; either way the controller is torn down
    /// before the task exits.
    pub fn spawn(
        config: PlaybackConfig,
        engine: Box<dyn MediaEngine>,
        background: Box<dyn BackgroundExecution>,
    ) -> (Self, JoinHandle<()>) {
        let events = EventBus::new(config.event_capacity);
        let (signal_tx, signal_rx) = signal_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let period = config.progress_interval();

        let controller =
            PlaybackController::new(config, engine, background, events.clone(), signal_tx);
        let handle = tokio::spawn(run(controller, command_rx, signal_rx, period));

        let player = Self {
            commands: command_tx,
            events,
        };
        (player, handle)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    // ===== Queue =====

    pub fn enqueue(&self, item: QueueItem) -> Result<()> {
        self.send(Command::Enqueue(item))
    }

    pub fn insert(&self, item: QueueItem, index: usize) -> Result<()> {
        self.send(Command::Insert { item, index })
    }

    pub fn dequeue_at(&self, index: usize) -> Result<()> {
        self.send(Command::DequeueAt(index))
    }

    pub fn dequeue_item(&self, item: QueueItem) -> Result<()> {
        self.send(Command::DequeueItem(item))
    }

    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        self.send(Command::MoveItem { from, to })
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Ordered copy of the queue
    pub async fn snapshot(&self) -> Result<Vec<QueueItem>> {
        self.request(Command::Snapshot).await
    }

    // ===== Transport =====

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Advance to the next item; `false` if the queue was exhausted
    pub async fn play_next_item(&self) -> Result<bool> {
        self.request(Command::PlayNext).await
    }

    /// Reload the selected item; `false` if nothing is selected
    pub async fn play_current_item(&self) -> Result<bool> {
        self.request(Command::PlayCurrent).await
    }

    pub async fn play_previous_item(&self) -> Result<bool> {
        self.request(Command::PlayPrevious).await
    }

    // ===== Seeking =====

    pub fn begin_seeking(&self) -> Result<()> {
        self.send(Command::BeginSeeking)
    }

    /// Seek without waiting for the outcome
    pub fn seek_to_progress(&self, progress: f64) -> Result<()> {
        self.send(Command::SeekToProgress {
            progress,
            completion: None,
        })
    }

    /// Seek and get a receiver for the outcome
    ///
    /// The receiver yields `true` once the seek lands and `false` if it was
    /// superseded or could not be issued.
    pub fn seek_to_progress_with_completion(
        &self,
        progress: f64,
    ) -> Result<oneshot::Receiver<bool>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SeekToProgress {
            progress,
            completion: Some(tx),
        })?;
        Ok(rx)
    }

    pub fn end_seeking(&self) -> Result<()> {
        self.send(Command::EndSeeking)
    }

    // ===== Settings and status =====

    pub fn set_autoplay_rule(&self, rule: AutoplayRule) -> Result<()> {
        self.send(Command::SetAutoplayRule(rule))
    }

    pub fn set_end_of_item_rule(&self, rule: EndOfItemRule) -> Result<()> {
        self.send(Command::SetEndOfItemRule(rule))
    }

    pub fn handle_remote(&self, command: RemoteCommand) -> Result<()> {
        self.send(Command::Remote(command))
    }

    pub async fn status(&self) -> Result<PlayerStatus> {
        self.request(Command::Status).await
    }

    /// Tear down the controller and stop the task
    ///
    /// Resolves once teardown has happened. Other handles fail with
    /// [`PlaybackError::ControllerClosed`] afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx))?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }
}

async fn run(
    mut controller: PlaybackController,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut signals: SignalReceiver,
    period: Duration,
) {
    info!(?period, "player task started");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown_ack = loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Shutdown(ack)) => break Some(ack),
                Some(command) => apply(&mut controller, command),
                None => break None,
            },
            Some(signal) = signals.recv() => controller.handle_signal(signal),
            _ = ticker.tick() => controller.tick(),
        }
    };

    controller.destroy_player();
    if let Some(ack) = shutdown_ack {
        let _ = ack.send(());
    }

    info!("player task stopped");
}

fn apply(controller: &mut PlaybackController, command: Command) {
    debug!(?command, "player command");

    match command {
        Command::Enqueue(item) => controller.enqueue(item),
        Command::Insert { item, index } => controller.insert(item, index),
        Command::DequeueAt(index) => {
            controller.dequeue_at(index);
        }
        Command::DequeueItem(item) => {
            controller.dequeue_by_value(&item);
        }
        Command::MoveItem { from, to } => {
            controller.move_item(from, to);
        }
        Command::Clear => controller.clear(),

        Command::Play => controller.play(),
        Command::Pause => controller.pause(),
        Command::Stop => controller.stop(),
        Command::PlayNext(reply) => {
            let _ = reply.send(controller.play_next_item());
        }
        Command::PlayCurrent(reply) => {
            let _ = reply.send(controller.play_current_item());
        }
        Command::PlayPrevious(reply) => {
            let _ = reply.send(controller.play_previous_item());
        }

        Command::BeginSeeking => controller.begin_seeking(),
        Command::SeekToProgress {
            progress,
            completion,
        } => controller.seek_to_progress(progress, completion),
        Command::EndSeeking => controller.end_seeking(),

        Command::SetAutoplayRule(rule) => controller.set_autoplay_rule(rule),
        Command::SetEndOfItemRule(rule) => controller.set_end_of_item_rule(rule),
        Command::Remote(remote) => controller.handle_remote(remote),

        Command::Status(reply) => {
            let _ = reply.send(controller.status());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }

        // Handled by the task loop
        Command::Shutdown(_) => {}
    }
}
