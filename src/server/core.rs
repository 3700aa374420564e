use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use crate::client::{
    ClientRecord, ClientRegistry, ConnectionWorker, UidAllocator, WorkerContext, WorkerCounter,
};
use crate::config::ServerConfig;
use crate::error::{RegistryError, ServerError};
use crate::events::{EventBus, LobbyEvent};
use crate::server::throttle::AcceptThrottle;
use crate::utils::network::bind_listener;

pub struct Server {
    registry: Arc<ClientRegistry>,
    listener: TcpListener,
    events: EventBus,
    active: WorkerCounter,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Sets up the listening socket and an empty registry sized by
    /// `config.max_clients`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config
            .socket_addr()
            .map_err(|_| ServerError::InvalidAddress(config.bind_address.clone()))?;

        let listener = bind_listener(addr, config.listen_backlog)?;
        let local = listener.local_addr().map_err(ServerError::Listen)?;

        info!("Current IP address of the server is: {}", local.ip());
        info!("Port number is: {}", local.port());

        Ok(Self {
            registry: Arc::new(ClientRegistry::with_capacity(config.max_clients)),
            listener,
            events: EventBus::new(),
            active: WorkerCounter::new(),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn active_workers(&self) -> WorkerCounter {
        self.active.clone()
    }

    /// Runs the accept loop. Never returns; the process runs until killed.
    pub async fn start(self) {
        info!("=== Welcome to the lobby ===");
        info!(
            "Accepting clients on {} (max {} clients)",
            self.local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            self.registry.capacity()
        );

        let mut uids = UidAllocator::new();
        let mut throttle =
            AcceptThrottle::new(self.config.accept_rate, self.config.accept_window());

        loop {
            throttle.wait().await;

            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    throttle.record(Instant::now());
                    self.admit(stream, addr, &mut uids).await;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    /// Admission control for one accepted connection: reject when the
    /// registry is full, otherwise issue an id, register and spawn a worker.
    async fn admit(&self, stream: TcpStream, addr: SocketAddr, uids: &mut UidAllocator) {
        // Only this loop adds to the registry and workers only remove, so a
        // slot seen free here is still free at `add`.
        if self.registry.is_full() {
            self.reject_at_capacity(stream, addr);
            return;
        }

        let id = match uids.next() {
            Ok(id) => id,
            Err(e) => {
                error!("Connection from {} dropped: {}", addr, e);
                return;
            }
        };

        let record = ClientRecord::new(id, addr);
        match self.registry.add(record.clone()).await {
            Ok(slot) => {
                info!(
                    "Client {} connected from {} ({}/{} clients)",
                    id,
                    addr,
                    self.registry.live_count(),
                    self.registry.capacity()
                );
                self.events.publish(LobbyEvent::Registered {
                    id,
                    address: addr,
                    slot,
                });
                ConnectionWorker::new(&record, stream, self.worker_context()).spawn();
            }
            Err(RegistryError::Full { .. }) => self.reject_at_capacity(stream, addr),
            Err(e) => {
                error!("Connection from {} dropped: {}", addr, e);
            }
        }
    }

    fn reject_at_capacity(&self, stream: TcpStream, addr: SocketAddr) {
        warn!(
            "Maximum clients connected. Connection rejected: {}",
            addr
        );
        drop(stream);
        self.events
            .publish(LobbyEvent::CapacityRejected { address: addr });
    }

    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            registry: Arc::clone(&self.registry),
            events: self.events.clone(),
            active: self.active.clone(),
            handshake_timeout: self.config.handshake_timeout(),
        }
    }
}
