//! Module `client::state`
//!
//! Defines `ClientRecord`, the per-connection entry kept in the registry,
//! and `WorkerState`, the lifecycle a connection worker moves through.

use std::fmt;
use std::net::SocketAddr;

use crate::client::{ClientId, DisplayName};

/// Represents one connected peer for the duration of its session.
///
/// The address and id are fixed at accept time. The display name stays
/// unset until the handshake succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientRecord {
    id: ClientId,
    address: SocketAddr,
    display_name: Option<DisplayName>,
}

impl ClientRecord {
    pub fn new(id: ClientId, address: SocketAddr) -> Self {
        Self {
            id,
            address,
            display_name: None,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the peer address captured when the connection was accepted.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the display name, if the handshake has completed.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn has_joined(&self) -> bool {
        self.display_name.is_some()
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_display_name(&mut self, name: DisplayName) {
        self.display_name = Some(name);
    }
}

/// Lifecycle of a connection worker.
///
/// `Started → AwaitingName → {Joined | Rejected} → Deregistered → Released`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Started,
    AwaitingName,
    Joined,
    Rejected,
    Deregistered,
    Released,
}

impl WorkerState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Started, AwaitingName)
                | (AwaitingName, Joined)
                | (AwaitingName, Rejected)
                | (Joined, Deregistered)
                | (Rejected, Deregistered)
                | (Deregistered, Released)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == WorkerState::Released
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Started => "started",
            WorkerState::AwaitingName => "awaiting-name",
            WorkerState::Joined => "joined",
            WorkerState::Rejected => "rejected",
            WorkerState::Deregistered => "deregistered",
            WorkerState::Released => "released",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_has_no_name() {
        let record = ClientRecord::new(ClientId(10), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(record.id(), ClientId(10));
        assert!(!record.has_joined());
        assert!(record.display_name().is_none());
    }

    #[test]
    fn both_handshake_outcomes_lead_to_deregistration() {
        use WorkerState::*;
        assert!(Started.can_transition_to(AwaitingName));
        assert!(AwaitingName.can_transition_to(Joined));
        assert!(AwaitingName.can_transition_to(Rejected));
        assert!(Joined.can_transition_to(Deregistered));
        assert!(Rejected.can_transition_to(Deregistered));
        assert!(Deregistered.can_transition_to(Released));

        assert!(!Started.can_transition_to(Joined));
        assert!(!Joined.can_transition_to(Released));
        assert!(!Released.can_transition_to(Started));
        assert!(Released.is_terminal());
    }
}
