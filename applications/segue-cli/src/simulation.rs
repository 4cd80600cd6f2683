//! Simulated media engine and background provider
//!
//! Stands in for a platform decoder so the controller can be exercised from a
//! terminal. Items "load" after a fixed delay and "play" against the tokio
//! clock; nothing is decoded.
//!
//! Every transport change bumps an epoch. Timer tasks capture the epoch they
//! were scheduled under and do nothing if it moved on while they slept.

use crate::config::SimulationSettings;
use segue_core::QueueItem;
use segue_playback::{
    BackgroundExecution, EngineFailure, ExpirationNotice, GrantId, MediaEngine, SeekTicket,
    SignalSink,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Default)]
struct Transport {
    epoch: u64,
    sink: Option<SignalSink>,
    loaded: bool,
    // Position when the transport last stopped moving
    offset: Duration,
    // Set while playing
    started: Option<Instant>,
}

impl Transport {
    fn position(&self, length: Duration) -> Duration {
        let moving = self.started.map_or(Duration::ZERO, |started| started.elapsed());
        (self.offset + moving).min(length)
    }
}

/// Timer-driven engine
///
/// Must be used from within a tokio runtime.
pub struct SimulatedEngine {
    settings: SimulationSettings,
    transport: Arc<Mutex<Transport>>,
}

impl SimulatedEngine {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            transport: Arc::new(Mutex::new(Transport::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transport> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `action` after `delay` unless the transport changed meanwhile
    fn schedule<F>(&self, epoch: u64, delay: Duration, action: F)
    where
        F: FnOnce(&mut Transport) + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut transport = transport.lock().unwrap_or_else(PoisonError::into_inner);
            if transport.epoch == epoch {
                action(&mut transport);
            }
        });
    }

    /// Schedule the end-of-item report for a running transport
    fn schedule_end(&self, transport: &Transport) {
        let length = self.settings.item_length();
        let remaining = length.saturating_sub(transport.position(length));

        self.schedule(transport.epoch, remaining, move |transport| {
            transport.offset = length;
            transport.started = None;
            if let Some(sink) = &transport.sink {
                sink.reached_end();
            }
        });
    }
}

impl MediaEngine for SimulatedEngine {
    fn load_asset(&mut self, item: &QueueItem, sink: SignalSink) {
        let failing = self
            .settings
            .fail_locations
            .iter()
            .any(|location| location == item.location().as_str());

        let epoch = {
            let mut transport = self.lock();
            transport.epoch += 1;
            transport.loaded = false;
            transport.offset = Duration::ZERO;
            transport.started = None;
            transport.sink = Some(sink);
            transport.epoch
        };
        debug!(item = %item, failing, "simulated load");

        let location = item.location().to_string();
        self.schedule(epoch, self.settings.load_delay(), move |transport| {
            let Some(sink) = &transport.sink else {
                return;
            };
            if failing {
                sink.failed(EngineFailure::NotPlayable(format!(
                    "{} is marked as failing",
                    location
                )));
            } else {
                transport.loaded = true;
                sink.ready();
            }
        });
    }

    fn play(&mut self) {
        let mut transport = self.lock();
        if !transport.loaded || transport.started.is_some() {
            return;
        }

        transport.epoch += 1;
        transport.started = Some(Instant::now());
        self.schedule_end(&transport);
    }

    fn pause(&mut self) {
        let length = self.settings.item_length();
        let mut transport = self.lock();

        transport.epoch += 1;
        transport.offset = transport.position(length);
        transport.started = None;
    }

    fn stop(&mut self) {
        let mut transport = self.lock();
        *transport = Transport {
            epoch: transport.epoch + 1,
            ..Transport::default()
        };
    }

    fn seek(&mut self, position: Duration, ticket: SeekTicket) {
        let length = self.settings.item_length();
        let mut transport = self.lock();
        if !transport.loaded {
            ticket.complete(false);
            return;
        }

        transport.epoch += 1;
        transport.offset = position.min(length);
        if transport.started.is_some() {
            transport.started = Some(Instant::now());
            self.schedule_end(&transport);
        }
        ticket.complete(true);
    }

    fn position(&self) -> Duration {
        self.lock().position(self.settings.item_length())
    }

    fn duration(&self) -> Option<Duration> {
        self.lock().loaded.then(|| self.settings.item_length())
    }

    fn buffered_ahead(&self) -> Duration {
        let length = self.settings.item_length();
        let transport = self.lock();
        if transport.loaded {
            length.saturating_sub(transport.position(length))
        } else {
            Duration::ZERO
        }
    }
}

/// Background provider that optionally revokes grants after a while
pub struct SimulatedBackground {
    expire_after: Option<Duration>,
}

impl SimulatedBackground {
    pub fn new(expire_after: Option<Duration>) -> Self {
        Self { expire_after }
    }
}

impl BackgroundExecution for SimulatedBackground {
    fn begin(&mut self, grant: GrantId, on_expire: ExpirationNotice) -> bool {
        info!(%grant, "background execution granted");

        if let Some(delay) = self.expire_after {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                info!(grant = %on_expire.grant(), "simulating background expiration");
                on_expire.expire();
            });
        }

        true
    }

    fn end(&mut self, grant: GrantId) {
        info!(%grant, "background execution returned");
    }
}
