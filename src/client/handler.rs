use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::client::name::NAME_LEN;
use crate::client::{ClientId, ClientRecord, ClientRegistry, DisplayName, WorkerState};
use crate::error::{HandshakeError, RegistryError};
use crate::events::{EventBus, LobbyEvent};

/// Process-wide count of running connection workers.
#[derive(Clone, Debug, Default)]
pub struct WorkerCounter(Arc<AtomicUsize>);

impl WorkerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> ActiveWorker {
        self.0.fetch_add(1, Ordering::AcqRel);
        ActiveWorker(Arc::clone(&self.0))
    }
}

/// Decrements the worker count when dropped, on every exit path.
struct ActiveWorker(Arc<AtomicUsize>);

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Shared handles every worker is constructed with.
#[derive(Clone)]
pub struct WorkerContext {
    pub registry: Arc<ClientRegistry>,
    pub events: EventBus,
    pub active: WorkerCounter,
    pub handshake_timeout: Duration,
}

/// How a connection's handshake ended.
#[derive(Debug)]
pub enum HandshakeOutcome {
    Joined(DisplayName),
    Rejected(HandshakeError),
}

/// What a worker leaves behind once it has released its connection.
#[derive(Debug)]
pub struct WorkerExit {
    pub outcome: HandshakeOutcome,
    /// The record taken out of the registry, if it was still there.
    pub record: Option<ClientRecord>,
    pub state: WorkerState,
}

/// Drives one accepted connection through its lifecycle.
///
/// - Reads a single name of up to `NAME_LEN` bytes, bounded by the
///   handshake timeout.
/// - Stores the name in the registry on success.
/// - Always removes its own registry entry and closes the socket before
///   returning, whatever the handshake outcome.
pub struct ConnectionWorker {
    id: ClientId,
    address: SocketAddr,
    stream: Option<TcpStream>,
    ctx: WorkerContext,
    state: WorkerState,
    active: Option<ActiveWorker>,
}

impl ConnectionWorker {
    pub fn new(record: &ClientRecord, stream: TcpStream, ctx: WorkerContext) -> Self {
        let active = ctx.active.enter();
        Self {
            id: record.id(),
            address: record.address(),
            stream: Some(stream),
            ctx,
            state: WorkerState::Started,
            active: Some(active),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the worker on its own task. Nobody awaits it.
    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    pub async fn run(mut self) -> WorkerExit {
        self.transition(WorkerState::AwaitingName);

        let outcome = match self.read_name().await {
            Ok(name) => {
                self.join(&name).await;
                HandshakeOutcome::Joined(name)
            }
            Err(e) => {
                self.reject(&e);
                HandshakeOutcome::Rejected(e)
            }
        };

        let record = self.deregister().await;
        self.release();

        let state = self.state();
        debug_assert!(state.is_terminal());
        WorkerExit {
            outcome,
            record,
            state,
        }
    }

    async fn read_name(&mut self) -> Result<DisplayName, HandshakeError> {
        let stream = self.stream.as_mut().ok_or(HandshakeError::PeerClosed)?;
        let mut buf = [0u8; NAME_LEN];

        let limit = self.ctx.handshake_timeout;

        let n = timeout(limit, stream.read(&mut buf))
            .await
            .map_err(|_| HandshakeError::Timeout(limit))??;
        if n == 0 {
            return Err(HandshakeError::PeerClosed);
        }

        DisplayName::parse(&buf[..n])
    }

    async fn join(&mut self, name: &DisplayName) {
        if let Err(e) = self
            .ctx
            .registry
            .set_display_name(self.id, name.clone())
            .await
        {
            warn!("Client {} joined without a registry slot: {}", self.id, e);
        }
        self.transition(WorkerState::Joined);
        info!("{} has joined", name);
        self.ctx.events.publish(LobbyEvent::Joined {
            id: self.id,
            name: name.clone(),
        });
    }

    fn reject(&mut self, err: &HandshakeError) {
        self.transition(WorkerState::Rejected);
        info!("Client {} ({}) rejected: {}", self.id, self.address, err);
        self.ctx.events.publish(LobbyEvent::Rejected {
            id: self.id,
            reason: err.to_string(),
        });
    }

    async fn deregister(&mut self) -> Option<ClientRecord> {
        let record = match self.ctx.registry.remove(self.id).await {
            Ok(record) => {
                debug!(
                    "Client {} removed from registry (joined: {})",
                    self.id,
                    record.has_joined()
                );
                Some(record)
            }
            Err(RegistryError::NotFound(id)) => {
                warn!("Client {} was already missing from the registry", id);
                None
            }
            Err(e) => {
                warn!("Failed to deregister client {}: {}", self.id, e);
                None
            }
        };
        self.transition(WorkerState::Deregistered);
        self.ctx
            .events
            .publish(LobbyEvent::Deregistered { id: self.id });
        record
    }

    fn release(&mut self) {
        // Dropping the stream closes the connection without a goodbye.
        drop(self.stream.take());
        drop(self.active.take());
        self.transition(WorkerState::Released);
        self.ctx.events.publish(LobbyEvent::Released { id: self.id });
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("Client {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }
}
