//! Chat lobby server
//!
//! Accepts TCP clients into a bounded registry and runs a short name
//! handshake for each on its own task before tearing the connection down.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod server;
pub mod utils;

pub use client::{ClientId, ClientRecord, ClientRegistry, DisplayName};
pub use config::ServerConfig;
pub use error::{HandshakeError, RegistryError, ServerError};
pub use events::{EventBus, LobbyEvent};
pub use server::Server;
