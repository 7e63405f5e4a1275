use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::gateway::Backend;

/// Backend reachability as shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Checking,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Checking => "checking",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        })
    }
}

/// Sole writer of [`ConnectionState`]. Everyone else holds a [`ConnectionWatch`].
pub struct ConnectionMonitor {
    backend: Arc<dyn Backend>,
    state: watch::Sender<ConnectionState>,
    generation: AtomicU64,
}

/// Read-only view of the connection state.
#[derive(Clone)]
pub struct ConnectionWatch {
    rx: watch::Receiver<ConnectionState>,
}

impl ConnectionMonitor {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Checking);
        Self {
            backend,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> ConnectionWatch {
        ConnectionWatch {
            rx: self.state.subscribe(),
        }
    }

    /// Re-enter `checking` and probe the backend status endpoint.
    ///
    /// When refreshes overlap, only the most recent probe decides the state.
    pub async fn refresh(&self) -> ConnectionState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(ConnectionState::Checking);

        let envelope = self.backend.status().await;
        let verdict = if envelope.success {
            ConnectionState::Connected
        } else {
            warn!(message = ?envelope.message, "Backend status probe failed");
            ConnectionState::Disconnected
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            let changed = *state != verdict;
            *state = verdict;
            changed
        });
        if applied {
            info!(state = %verdict, "Backend connection state changed");
        }
        verdict
    }
}

impl ConnectionWatch {
    pub fn current(&self) -> ConnectionState {
        *self.rx.borrow()
    }

    /// Wait for the next state change. `None` once the monitor is gone.
    pub async fn changed(&mut self) -> Option<ConnectionState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
