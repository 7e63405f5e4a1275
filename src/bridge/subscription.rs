use std::sync::Weak;

use tokio::sync::mpsc;

use super::messages::HostEvent;
use super::ui::UiInner;
use super::EventChannel;

/// Live subscription to one host event channel. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    channel: EventChannel,
    events: mpsc::UnboundedReceiver<HostEvent>,
    bridge: Weak<UiInner>,
}

impl Subscription {
    pub(super) fn new(
        id: u64,
        channel: EventChannel,
        events: mpsc::UnboundedReceiver<HostEvent>,
        bridge: Weak<UiInner>,
    ) -> Self {
        Self {
            id,
            channel,
            events,
            bridge,
        }
    }

    pub fn channel(&self) -> EventChannel {
        self.channel
    }

    /// Next event, or `None` once the bridge has shut down.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.unsubscribe(self.channel, self.id);
        }
    }
}
