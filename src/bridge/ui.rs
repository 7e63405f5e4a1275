use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::frame::Frame;
use super::messages::{
    HostEvent, MessageBoxOptions, MessageBoxResult, OpenDialogOptions, OpenDialogResult,
};
use super::subscription::Subscription;
use super::{BridgeError, EventChannel, InvokeChannel};

type Pending = HashMap<u64, oneshot::Sender<Result<Value, BridgeError>>>;
type Subscribers = HashMap<EventChannel, Vec<(u64, mpsc::UnboundedSender<HostEvent>)>>;

/// UI-side end of the process bridge.
///
/// Cheap to clone; all clones share pending calls and subscriptions.
#[derive(Clone)]
pub struct UiBridge {
    inner: Arc<UiInner>,
}

pub(super) struct UiInner {
    outgoing: mpsc::Sender<String>,
    pending: Mutex<Pending>,
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl UiBridge {
    pub(super) fn start(
        outgoing: mpsc::Sender<String>,
        incoming: mpsc::Receiver<String>,
        timeout: Duration,
    ) -> Self {
        let inner = Arc::new(UiInner {
            outgoing,
            pending: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout,
        });
        tokio::spawn(read_frames(incoming, Arc::downgrade(&inner)));
        Self { inner }
    }

    /// Invoke a host operation by channel name. Names outside the allow-list
    /// are rejected before anything crosses the boundary.
    pub async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, BridgeError> {
        let channel: InvokeChannel = channel.parse()?;
        self.invoke_channel(channel, payload).await
    }

    pub async fn get_app_version(&self) -> Result<String, BridgeError> {
        self.call(InvokeChannel::GetAppVersion, &Value::Null).await
    }

    pub async fn show_message_box(
        &self,
        options: &MessageBoxOptions,
    ) -> Result<MessageBoxResult, BridgeError> {
        self.call(InvokeChannel::ShowMessageBox, options).await
    }

    pub async fn show_open_dialog(
        &self,
        options: &OpenDialogOptions,
    ) -> Result<OpenDialogResult, BridgeError> {
        self.call(InvokeChannel::ShowOpenDialog, options).await
    }

    /// Subscribe to a host event. Dropping the returned handle unsubscribes.
    pub fn subscribe(&self, channel: EventChannel) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.inner.subscribers)
            .entry(channel)
            .or_default()
            .push((id, tx));
        debug!(channel = %channel, id, "Subscribed to host event");
        Subscription::new(id, channel, rx, Arc::downgrade(&self.inner))
    }

    /// Subscribe by event name, enforcing the allow-list.
    pub fn subscribe_named(&self, channel: &str) -> Result<Subscription, BridgeError> {
        Ok(self.subscribe(channel.parse()?))
    }

    pub fn subscriber_count(&self, channel: EventChannel) -> usize {
        lock(&self.inner.subscribers)
            .get(&channel)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn call<P, R>(&self, channel: InvokeChannel, payload: &P) -> Result<R, BridgeError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload =
            serde_json::to_value(payload).map_err(|err| BridgeError::Payload(err.to_string()))?;
        let value = self.invoke_channel(channel, payload).await?;
        serde_json::from_value(value).map_err(|err| BridgeError::Payload(err.to_string()))
    }

    async fn invoke_channel(
        &self,
        channel: InvokeChannel,
        payload: Value,
    ) -> Result<Value, BridgeError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::Invoke {
            id,
            channel: channel.name().to_string(),
            payload,
        };
        let line = frame
            .encode()
            .map_err(|err| BridgeError::Payload(err.to_string()))?;

        let (tx, rx) = oneshot::channel();
        lock(&self.inner.pending).insert(id, tx);
        let _pending = PendingCall {
            inner: &self.inner,
            id,
        };

        let exchange = async {
            self.inner
                .outgoing
                .send(line)
                .await
                .map_err(|_| BridgeError::Transport("host process is unreachable".to_string()))?;
            rx.await.map_err(|_| {
                BridgeError::Transport("host process closed the bridge".to_string())
            })?
        };

        if channel.is_interactive() {
            return exchange.await;
        }
        match tokio::time::timeout(self.inner.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(channel = %channel, id, "Bridge call timed out");
                Err(BridgeError::Timeout(channel.name()))
            }
        }
    }

    /// Calls still waiting for a host reply.
    pub fn pending_calls(&self) -> usize {
        lock(&self.inner.pending).len()
    }
}

/// Removes a call's reply slot however the call ends, including when the
/// caller drops the future.
struct PendingCall<'a> {
    inner: &'a UiInner,
    id: u64,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        lock(&self.inner.pending).remove(&self.id);
    }
}

impl UiInner {
    pub(super) fn unsubscribe(&self, channel: EventChannel, id: u64) {
        let mut subscribers = lock(&self.subscribers);
        if let Some(list) = subscribers.get_mut(&channel) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                subscribers.remove(&channel);
            }
        }
        debug!(channel = %channel, id, "Unsubscribed from host event");
    }

    fn resolve(&self, id: u64, outcome: Result<Value, BridgeError>) {
        match lock(&self.pending).remove(&id) {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => debug!(id, "Dropping reply for unknown or expired call"),
        }
    }

    fn dispatch(&self, event: HostEvent) {
        let mut subscribers = lock(&self.subscribers);
        let Some(list) = subscribers.get_mut(&event.channel()) else {
            debug!(channel = %event.channel(), "No subscribers for host event");
            return;
        };
        list.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Fail outstanding calls and end every subscription.
    fn shutdown(&self) {
        lock(&self.subscribers).clear();
        let drained: Vec<_> = lock(&self.pending).drain().collect();
        for (_, tx) in drained {
            let _ = tx.send(Err(BridgeError::Transport(
                "host process closed the bridge".to_string(),
            )));
        }
    }
}

async fn read_frames(mut incoming: mpsc::Receiver<String>, inner: Weak<UiInner>) {
    while let Some(line) = incoming.recv().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        match Frame::decode(&line) {
            Ok(Frame::Reply { id, ok, error }) => {
                let outcome = match error {
                    Some(message) => Err(BridgeError::Rejected(message)),
                    None => Ok(ok.unwrap_or(Value::Null)),
                };
                inner.resolve(id, outcome);
            }
            Ok(Frame::Event { channel, payload }) => match HostEvent::from_parts(&channel, payload)
            {
                Ok(event) => inner.dispatch(event),
                Err(err) => warn!(channel = %channel, error = %err, "Ignoring host event"),
            },
            Ok(Frame::Invoke { channel, .. }) => {
                warn!(channel = %channel, "Host attempted to invoke the UI side; ignoring");
            }
            Err(err) => warn!(error = %err, "Malformed bridge frame"),
        }
    }

    if let Some(inner) = inner.upgrade() {
        inner.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
