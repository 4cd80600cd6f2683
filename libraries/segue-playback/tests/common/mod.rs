//! Shared test doubles for controller and player tests

#![allow(dead_code)]

use segue_playback::{
    BackgroundExecution, EngineFailure, EventBus, ExpirationNotice, GrantId, MediaEngine,
    PlaybackConfig, PlaybackController, PlayerEvent, QueueItem, SeekTicket, SignalReceiver,
    SignalSink, signal_channel,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ===== Engine =====

/// Call recorded by [`MockEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Play,
    Pause,
    Stop,
    Seek(Duration),
}

/// Everything the mock engine saw, plus the values it reports
pub struct EngineLog {
    pub calls: Vec<EngineCall>,
    pub sinks: Vec<SignalSink>,
    pub tickets: Vec<SeekTicket>,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub buffered: Duration,
}

impl Default for EngineLog {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            sinks: Vec::new(),
            tickets: Vec::new(),
            position: Duration::ZERO,
            duration: Some(Duration::from_secs(120)),
            buffered: Duration::from_secs(10),
        }
    }
}

/// Engine that records calls and leaves every report to the test
#[derive(Clone, Default)]
pub struct MockEngine {
    pub log: Arc<Mutex<EngineLog>>,
}

impl MediaEngine for MockEngine {
    fn load_asset(&mut self, item: &QueueItem, sink: SignalSink) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Load(item.display_name().to_string()));
        log.sinks.push(sink);
        log.position = Duration::ZERO;
    }

    fn play(&mut self) {
        self.log.lock().unwrap().calls.push(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().calls.push(EngineCall::Pause);
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Stop);
        log.position = Duration::ZERO;
    }

    fn seek(&mut self, position: Duration, ticket: SeekTicket) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Seek(position));
        log.tickets.push(ticket);
        log.position = position;
    }

    fn position(&self) -> Duration {
        self.log.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        self.log.lock().unwrap().duration
    }

    fn buffered_ahead(&self) -> Duration {
        self.log.lock().unwrap().buffered
    }
}

// ===== Background =====

#[derive(Default)]
pub struct GrantLog {
    pub begun: Vec<GrantId>,
    pub ended: Vec<GrantId>,
    pub notices: Vec<ExpirationNotice>,
}

/// Background provider that always grants and records every call
#[derive(Clone, Default)]
pub struct MockBackground {
    pub log: Arc<Mutex<GrantLog>>,
}

impl BackgroundExecution for MockBackground {
    fn begin(&mut self, grant: GrantId, on_expire: ExpirationNotice) -> bool {
        let mut log = self.log.lock().unwrap();
        log.begun.push(grant);
        log.notices.push(on_expire);
        true
    }

    fn end(&mut self, grant: GrantId) {
        self.log.lock().unwrap().ended.push(grant);
    }
}

// ===== Items =====

pub fn item(name: &str) -> QueueItem {
    QueueItem::new(&format!("https://media.test/{}.mp3", name), name).unwrap()
}

pub fn names(items: &[QueueItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.display_name().to_string())
        .collect()
}

// ===== Harness =====

/// Controller wired to mocks, with manual signal delivery
pub struct Harness {
    pub controller: PlaybackController,
    pub signals: SignalReceiver,
    pub events: broadcast::Receiver<PlayerEvent>,
    pub engine: Arc<Mutex<EngineLog>>,
    pub grants: Arc<Mutex<GrantLog>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        let engine = MockEngine::default();
        let background = MockBackground::default();
        let bus = EventBus::new(1024);
        let events = bus.subscribe();
        let (tx, signals) = signal_channel();

        let engine_log = engine.log.clone();
        let grant_log = background.log.clone();
        let controller =
            PlaybackController::new(config, Box::new(engine), Box::new(background), bus, tx);

        Self {
            controller,
            signals,
            events,
            engine: engine_log,
            grants: grant_log,
        }
    }

    pub fn with_items(names: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.enqueue(names);
        harness
    }

    pub fn enqueue(&mut self, names: &[&str]) {
        for name in names {
            self.controller.enqueue(item(name));
        }
    }

    /// Deliver every pending signal to the controller
    pub fn pump(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            self.controller.handle_signal(signal);
        }
    }

    /// Events published since the last drain
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn event_names(&mut self) -> Vec<&'static str> {
        self.drain_events().iter().map(PlayerEvent::name).collect()
    }

    /// Sink handed to the engine by the most recent load
    pub fn last_sink(&self) -> SignalSink {
        self.engine
            .lock()
            .unwrap()
            .sinks
            .last()
            .cloned()
            .expect("no asset loaded")
    }

    /// Sink handed to the engine by load number `index`
    pub fn sink(&self, index: usize) -> SignalSink {
        self.engine.lock().unwrap().sinks[index].clone()
    }

    pub fn ready(&mut self) {
        self.last_sink().ready();
        self.pump();
    }

    pub fn fail(&mut self, cause: EngineFailure) {
        self.last_sink().failed(cause);
        self.pump();
    }

    pub fn stall(&mut self) {
        self.last_sink().stalled();
        self.pump();
    }

    pub fn reach_end(&mut self) {
        self.last_sink().reached_end();
        self.pump();
    }

    /// Load the selected (or first) item and bring it to Playing
    pub fn start_playing(&mut self) {
        self.controller.play();
        self.ready();
    }

    /// Take the oldest outstanding seek ticket
    pub fn take_ticket(&self) -> SeekTicket {
        self.engine.lock().unwrap().tickets.remove(0)
    }

    pub fn set_position(&self, seconds: f64) {
        self.engine.lock().unwrap().position = Duration::from_secs_f64(seconds);
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.engine.lock().unwrap().duration = duration;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.engine.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.engine.lock().unwrap().calls.clear();
    }

    /// Names of the items loaded so far, in order
    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Load(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn grants_begun(&self) -> usize {
        self.grants.lock().unwrap().begun.len()
    }

    pub fn grants_ended(&self) -> usize {
        self.grants.lock().unwrap().ended.len()
    }
}
