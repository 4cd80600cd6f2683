//! Background execution grant
//!
//! While audio is actively playing the process asks the OS for permission to
//! keep running in the background. [`BackgroundTaskGuard`] holds at most one
//! such grant at a time:
//!
//! - `acquire` requests a grant unless one is already held
//! - `release` returns it; releasing twice is a no-op
//! - `expire` handles the OS revoking the grant on its own
//!
//! How a grant is actually obtained is platform specific and lives behind
//! [`BackgroundExecution`].

use crate::engine::{Signal, SignalSender};
use tracing::{debug, warn};

/// Identifier of one background execution grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantId(pub u64);

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grant#{}", self.0)
    }
}

/// Notifier a provider fires when the OS revokes a grant
#[derive(Debug, Clone)]
pub struct ExpirationNotice {
    grant: GrantId,
    tx: SignalSender,
}

impl ExpirationNotice {
    pub fn grant(&self) -> GrantId {
        self.grant
    }

    /// Tell the controller the grant is gone
    pub fn expire(self) {
        if self.tx.send(Signal::GrantExpired { grant: self.grant }).is_err() {
            debug!(grant = %self.grant, "controller gone, expiration dropped");
        }
    }
}

/// Platform hook for background execution grants
pub trait BackgroundExecution: Send {
    /// Ask the OS for a grant identified by `grant`
    ///
    /// Returns `false` if the OS refused. Providers that can be revoked must
    /// keep `on_expire` and fire it when that happens.
    fn begin(&mut self, grant: GrantId, on_expire: ExpirationNotice) -> bool;

    /// Give a grant back to the OS
    fn end(&mut self, grant: GrantId);
}

/// Provider for platforms that never suspend background work
#[derive(Debug, Default, Clone, Copy)]
pub struct UnrestrictedBackground;

impl BackgroundExecution for UnrestrictedBackground {
    fn begin(&mut self, _grant: GrantId, _on_expire: ExpirationNotice) -> bool {
        true
    }

    fn end(&mut self, _grant: GrantId) {}
}

/// Holder of at most one background execution grant
pub struct BackgroundTaskGuard {
    provider: Box<dyn BackgroundExecution>,
    signals: SignalSender,
    active: Option<GrantId>,
    next_grant: u64,
}

impl BackgroundTaskGuard {
    pub fn new(provider: Box<dyn BackgroundExecution>, signals: SignalSender) -> Self {
        Self {
            provider,
            signals,
            active: None,
            next_grant: 0,
        }
    }

    /// Request a grant unless one is already held
    ///
    /// Returns `true` when a new grant was obtained.
    pub fn acquire(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }

        self.next_grant += 1;
        let grant = GrantId(self.next_grant);
        let notice = ExpirationNotice {
            grant,
            tx: self.signals.clone(),
        };

        if self.provider.begin(grant, notice) {
            debug!(%grant, "background grant acquired");
            self.active = Some(grant);
            true
        } else {
            warn!(%grant, "background grant refused");
            false
        }
    }

    /// Return the held grant, if any
    pub fn release(&mut self) {
        if let Some(grant) = self.active.take() {
            debug!(%grant, "background grant released");
            self.provider.end(grant);
        }
    }

    /// Handle the OS revoking `grant`
    ///
    /// Returns `true` if it was the grant currently held, which the guard then
    /// releases. Expirations of grants already returned are ignored.
    pub fn expire(&mut self, grant: GrantId) -> bool {
        if self.active == Some(grant) {
            warn!(%grant, "background grant expired");
            self.release();
            true
        } else {
            debug!(%grant, "ignoring expiration of inactive grant");
            false
        }
    }

    pub fn is_held(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_grant(&self) -> Option<GrantId> {
        self.active
    }
}
