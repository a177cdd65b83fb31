use super::record::ConsentRecord;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tokio::sync::broadcast;

/// Capacity of the consent event channel. Slow subscribers lag instead of blocking the page.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// What the visitor did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentAction {
    Accepted,
    Rejected,
}

impl Display for ConsentAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentAction::Accepted => write!(f, "accepted"),
            ConsentAction::Rejected => write!(f, "rejected"),
        }
    }
}

/// Payload of the page-wide consent notification: `{"action": ..., "consent": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentEvent {
    pub action: ConsentAction,
    pub consent: ConsentRecord,
}

/// A handle for receiving consent change notifications.
pub type Subscription = broadcast::Receiver<ConsentEvent>;

#[derive(Debug)]
pub(crate) struct ConsentBus {
    tx: broadcast::Sender<ConsentEvent>,
}

impl Default for ConsentBus {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl ConsentBus {
    pub(crate) fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, ev: ConsentEvent) {
        // send() only fails when nobody is subscribed, which is fine.
        let _ = self.tx.send(ev);
    }
}
