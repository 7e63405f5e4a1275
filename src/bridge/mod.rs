//! Allow-listed request/response and event channel between the privileged
//! host and the sandboxed UI side.
//!
//! Frames travel as JSON text over a pair of bounded channels; the two sides
//! share no state. Only the operations in [`InvokeChannel`] can be invoked and
//! only the events in [`EventChannel`] can be pushed. Both ends enforce this.

mod channels;
mod frame;
mod host;
mod messages;
mod subscription;
mod ui;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

pub use channels::{EventChannel, InvokeChannel};
pub use frame::Frame;
pub use host::{EventEmitter, HostBridge, HostHandler};
pub use messages::{
    DialogProperty, HostEvent, MessageBoxKind, MessageBoxOptions, MessageBoxResult,
    OpenDialogOptions, OpenDialogResult,
};
pub use subscription::Subscription;
pub use ui::UiBridge;

const FRAME_BUFFER: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("channel not allowed: {0}")]
    ChannelNotAllowed(String),

    #[error("bridge transport error: {0}")]
    Transport(String),

    #[error("bridge call on {0} timed out")]
    Timeout(&'static str),

    #[error("host rejected the request: {0}")]
    Rejected(String),

    #[error("invalid bridge payload: {0}")]
    Payload(String),
}

/// Build a connected pair of bridge ends.
///
/// Must be called inside a tokio runtime: the UI end spawns its frame reader.
/// Non-interactive calls fail with [`BridgeError::Timeout`] after `timeout`.
pub fn pair(timeout: Duration) -> (UiBridge, HostBridge) {
    let (to_host, from_ui) = mpsc::channel(FRAME_BUFFER);
    let (to_ui, from_host) = mpsc::channel(FRAME_BUFFER);
    let ui = UiBridge::start(to_host, from_host, timeout);
    let host = HostBridge::new(to_ui, from_ui);
    (ui, host)
}
