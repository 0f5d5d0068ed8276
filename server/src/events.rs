use larder_common::events::{ChangeEvent, ChangeKind};
use larder_common::ItemId;
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 64;

/// Fan-out of change events to every open session.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        EventHub { tx }
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, kind: ChangeKind, id: Option<&ItemId>) {
        let event = ChangeEvent::new(kind, id.cloned());
        // No subscribers is normal; nobody needs telling.
        if let Ok(n) = self.tx.send(event) {
            debug!(?kind, subscribers = n, "published change event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}
