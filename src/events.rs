//! Lifecycle events
//!
//! The accept loop and the connection workers publish a `LobbyEvent` at
//! every registry-visible step. Publishing never blocks and never fails;
//! events with no subscriber are dropped.

use std::net::SocketAddr;

use tokio::sync::broadcast;

use crate::client::{ClientId, DisplayName};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LobbyEvent {
    /// A connection was admitted and stored in a registry slot.
    Registered {
        id: ClientId,
        address: SocketAddr,
        slot: usize,
    },
    /// The handshake succeeded.
    Joined { id: ClientId, name: DisplayName },
    /// The handshake failed.
    Rejected { id: ClientId, reason: String },
    /// The worker removed its record from the registry.
    Deregistered { id: ClientId },
    /// The worker closed its socket and exited.
    Released { id: ClientId },
    /// The registry was full; the connection was closed unregistered.
    CapacityRejected { address: SocketAddr },
}

/// Cloneable publishing side of the event channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<LobbyEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: LobbyEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LobbyEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
