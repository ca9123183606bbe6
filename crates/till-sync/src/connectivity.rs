//! # Connectivity Signal
//!
//! A process-wide online/offline flag built on a `tokio::sync::watch`
//! channel. Whoever detects connectivity (a heartbeat pinger, an OS network
//! listener, a manual toggle in the UI) flips the flag; the queue worker
//! subscribes and drains on every offline→online edge.
//!
//! The signal carries state, not events: late subscribers immediately see
//! the current value, and redundant `set_online(true)` calls do not wake
//! anyone.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Cloneable handle to the shared online/offline flag.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    /// Creates a signal with an initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        ConnectivitySignal { tx: Arc::new(tx) }
    }

    /// Updates the flag. Subscribers are only woken when the value changes.
    pub fn set_online(&self, online: bool) {
        let previous = self.tx.send_replace(online);
        if previous != online {
            info!(online, "Connectivity changed");
        }
    }

    /// Current state.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivitySignal {
    /// Starts offline; the detector flips it once connectivity is confirmed.
    fn default() -> Self {
        ConnectivitySignal::new(false)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
