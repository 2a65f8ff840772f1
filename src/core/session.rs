//! Session bookkeeping for the streaming HTTP transport.
//!
//! Counters are owned by a [`SessionTracker`] that is created once in `main`
//! and handed to whoever needs it. They are for observability only and never
//! limit how many sessions may be open.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{info, warn};

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: u64,
    pub active: u64,
    pub errors: u64,
}

/// Process-lifetime session counters.
#[derive(Debug, Default)]
pub struct SessionTracker {
    total: AtomicU64,
    active: AtomicU64,
    errors: AtomicU64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened session. Returns the number of active sessions.
    pub fn on_open(&self) -> u64 {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a closed session. `active` never drops below zero.
    pub fn on_close(&self) -> u64 {
        match self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => {
                warn!("Session close without a matching open");
                0
            }
        }
    }

    /// Record a transport-level failure.
    pub fn on_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            total: self.total.load(Ordering::SeqCst),
            active: self.active.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
        }
    }

    /// Open a session whose close is recorded when the guard is dropped.
    pub fn open(self: &Arc<Self>) -> SessionGuard {
        let active = self.on_open();
        info!("New SSE session - active sessions: {}", active);
        SessionGuard {
            tracker: Arc::clone(self),
        }
    }
}

/// Keeps one session open; dropping it closes the session exactly once.
#[derive(Debug)]
pub struct SessionGuard {
    tracker: Arc<SessionTracker>,
}

impl SessionGuard {
    /// Record a transport failure against this session's tracker.
    pub fn record_error(&self) {
        self.tracker.on_error();
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let active = self.tracker.on_close();
        info!("SSE session closed - active sessions: {}", active);
    }
}
