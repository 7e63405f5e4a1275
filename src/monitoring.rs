use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::gateway::{Backend, MonitoringSnapshot};
use crate::types::ShellError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Refreshes the monitoring snapshot on a fixed interval and on demand.
///
/// A failed fetch never replaces the held snapshot; it only sets the error
/// side channel. At most one interval task exists per poller.
pub struct MonitoringPoller {
    backend: Arc<dyn Backend>,
    interval: Duration,
    shared: Arc<Shared>,
    task: Mutex<Option<PollTask>>,
}

struct Shared {
    snapshot: watch::Sender<Option<MonitoringSnapshot>>,
    error: watch::Sender<Option<String>>,
    /// Checked and held while a result is applied, so teardown cannot race an apply.
    active: Mutex<bool>,
}

struct PollTask {
    handle: JoinHandle<()>,
    refresh: mpsc::Sender<()>,
}

impl MonitoringPoller {
    pub fn new(backend: Arc<dyn Backend>, interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (error, _) = watch::channel(None);
        Self {
            backend,
            interval,
            shared: Arc::new(Shared {
                snapshot,
                error,
                active: Mutex::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> Option<MonitoringSnapshot> {
        self.shared.snapshot.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Option<MonitoringSnapshot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.error.borrow().clone()
    }

    pub fn watch_errors(&self) -> watch::Receiver<Option<String>> {
        self.shared.error.subscribe()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.task).is_some()
    }

    /// Fetch immediately, then every interval until [`deactivate`](Self::deactivate).
    /// Activating an active poller does nothing.
    pub fn activate(&self) {
        let mut task = lock(&self.task);
        if task.is_some() {
            debug!("Monitoring poller already active");
            return;
        }

        *lock(&self.shared.active) = true;
        let (refresh, refresh_rx) = mpsc::channel(1);
        let handle = tokio::spawn(run(
            Arc::clone(&self.backend),
            Arc::clone(&self.shared),
            self.interval,
            refresh_rx,
        ));
        *task = Some(PollTask { handle, refresh });
        info!(interval_secs = self.interval.as_secs(), "Monitoring poller activated");
    }

    /// Stop the interval. No fetch starts afterwards and a response still in
    /// flight is dropped.
    pub fn deactivate(&self) {
        let Some(task) = lock(&self.task).take() else {
            return;
        };
        *lock(&self.shared.active) = false;
        task.handle.abort();
        info!("Monitoring poller deactivated");
    }

    /// Request an extra fetch. While active this is queued on the existing
    /// interval task; requests arriving while one is queued are coalesced.
    pub async fn refresh(&self) -> Result<(), ShellError> {
        let sender = lock(&self.task).as_ref().map(|task| task.refresh.clone());
        match sender {
            Some(sender) => {
                let _ = sender.try_send(());
                Ok(())
            }
            None => self.fetch_once().await,
        }
    }

    /// One fetch outside the interval, used while the poller is inactive.
    pub async fn fetch_once(&self) -> Result<(), ShellError> {
        let envelope = self.backend.monitoring_dashboard().await;
        let outcome = envelope
            .into_result()
            .and_then(|data| data.ok_or_else(|| ShellError::Backend(EMPTY_DASHBOARD.to_string())));
        match outcome {
            Ok(payload) => {
                self.shared.apply_snapshot(MonitoringSnapshot::from_payload(&payload, Utc::now()));
                Ok(())
            }
            Err(err) => {
                self.shared.apply_error(err.user_message());
                Err(err)
            }
        }
    }
}

impl Drop for MonitoringPoller {
    fn drop(&mut self) {
        self.deactivate();
    }
}

const EMPTY_DASHBOARD: &str = "monitoring dashboard returned no data";

impl Shared {
    fn apply_snapshot(&self, snapshot: MonitoringSnapshot) {
        self.snapshot.send_replace(Some(snapshot));
        self.error.send_replace(None);
    }

    fn apply_error(&self, message: String) {
        warn!(message = %message, "Monitoring refresh failed; keeping previous snapshot");
        self.error.send_replace(Some(message));
    }

    /// Apply a polled result unless the poller was torn down meanwhile.
    fn apply_polled(&self, outcome: Result<MonitoringSnapshot, String>) {
        let active = lock(&self.active);
        if !*active {
            debug!("Discarding monitoring response that arrived after teardown");
            return;
        }
        match outcome {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(message) => self.apply_error(message),
        }
    }
}

async fn run(
    backend: Arc<dyn Backend>,
    shared: Arc<Shared>,
    period: Duration,
    mut refresh: mpsc::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(()) = refresh.recv() => debug!("Manual monitoring refresh"),
        }

        let envelope = backend.monitoring_dashboard().await;
        let outcome = if envelope.success {
            match envelope.data {
                Some(payload) => Ok(MonitoringSnapshot::from_payload(&payload, Utc::now())),
                None => Err(EMPTY_DASHBOARD.to_string()),
            }
        } else {
            Err(envelope.message_or("failed to load monitoring data").to_string())
        };
        shared.apply_polled(outcome);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
