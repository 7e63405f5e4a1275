use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::frame::Frame;
use super::messages::{
    HostEvent, MessageBoxOptions, MessageBoxResult, OpenDialogOptions, OpenDialogResult,
};
use super::{BridgeError, InvokeChannel};

/// Privileged capabilities the host exposes over the bridge.
#[async_trait]
pub trait HostHandler: Send + Sync {
    async fn app_version(&self) -> Result<String, BridgeError>;

    async fn show_message_box(
        &self,
        options: MessageBoxOptions,
    ) -> Result<MessageBoxResult, BridgeError>;

    async fn show_open_dialog(
        &self,
        options: OpenDialogOptions,
    ) -> Result<OpenDialogResult, BridgeError>;
}

/// Host-side end of the process bridge.
pub struct HostBridge {
    outgoing: mpsc::Sender<String>,
    incoming: mpsc::Receiver<String>,
}

/// Pushes host events to the UI side. Cloneable.
#[derive(Clone)]
pub struct EventEmitter {
    outgoing: mpsc::Sender<String>,
}

impl HostBridge {
    pub(super) fn new(outgoing: mpsc::Sender<String>, incoming: mpsc::Receiver<String>) -> Self {
        Self { outgoing, incoming }
    }

    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            outgoing: self.outgoing.clone(),
        }
    }

    /// Answer UI requests until the UI side goes away.
    ///
    /// Requests are handled one at a time, so a native dialog holds up this
    /// loop while the UI side keeps running.
    pub async fn serve(mut self, handler: Arc<dyn HostHandler>) {
        info!("Host bridge serving");
        while let Some(line) = self.incoming.recv().await {
            let frame = match Frame::decode(&line) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error = %err, "Malformed bridge frame from UI");
                    continue;
                }
            };

            let Frame::Invoke {
                id,
                channel,
                payload,
            } = frame
            else {
                warn!("UI sent a non-invoke frame; ignoring");
                continue;
            };

            let outcome = match channel.parse::<InvokeChannel>() {
                Ok(allowed) => dispatch(handler.as_ref(), allowed, payload).await,
                Err(err) => {
                    warn!(channel = %channel, "Rejected invoke on channel outside the allow-list");
                    Err(err)
                }
            };

            let reply = Frame::reply(id, outcome.map_err(|err| err.to_string()));
            let line = match reply.encode() {
                Ok(line) => line,
                Err(err) => {
                    warn!(id, error = %err, "Failed to encode bridge reply");
                    continue;
                }
            };
            if self.outgoing.send(line).await.is_err() {
                debug!("UI side closed the bridge");
                break;
            }
        }
        info!("Host bridge stopped");
    }
}

impl EventEmitter {
    pub async fn emit(&self, event: HostEvent) -> Result<(), BridgeError> {
        let frame = Frame::Event {
            channel: event.channel().name().to_string(),
            payload: event.payload(),
        };
        let line = frame
            .encode()
            .map_err(|err| BridgeError::Payload(err.to_string()))?;
        self.outgoing
            .send(line)
            .await
            .map_err(|_| BridgeError::Transport("UI process is unreachable".to_string()))?;
        debug!(channel = %event.channel(), "Pushed host event");
        Ok(())
    }
}

async fn dispatch(
    handler: &dyn HostHandler,
    channel: InvokeChannel,
    payload: Value,
) -> Result<Value, BridgeError> {
    match channel {
        InvokeChannel::GetAppVersion => handler.app_version().await.map(Value::String),
        InvokeChannel::ShowMessageBox => {
            let options: MessageBoxOptions = decode(payload)?;
            encode(&handler.show_message_box(options).await?)
        }
        InvokeChannel::ShowOpenDialog => {
            let options: OpenDialogOptions = decode(payload)?;
            encode(&handler.show_open_dialog(options).await?)
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, BridgeError> {
    serde_json::from_value(payload).map_err(|err| BridgeError::Payload(err.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, BridgeError> {
    serde_json::to_value(value).map_err(|err| BridgeError::Payload(err.to_string()))
}
