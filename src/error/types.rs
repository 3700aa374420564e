//! Error types
//!
//! Defines the error types for each layer of the lobby: startup, registry,
//! handshake and id allocation.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use crate::client::ClientId;

/// Registry module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every slot is occupied.
    Full { capacity: usize },
    /// No occupied slot holds this id.
    NotFound(ClientId),
    /// The id is already registered in another slot.
    DuplicateId(ClientId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Full { capacity } => {
                write!(f, "Registry full ({} slots occupied)", capacity)
            }
            RegistryError::NotFound(id) => write!(f, "Client {} not registered", id),
            RegistryError::DuplicateId(id) => write!(f, "Client {} already registered", id),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Reasons a connection fails the name handshake
#[derive(Debug)]
pub enum HandshakeError {
    PeerClosed,
    Io(io::Error),
    Timeout(Duration),
    TooShort(usize),
    TooLong(usize),
    NotUtf8,
    NotPrintable,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::PeerClosed => write!(f, "Peer closed before sending a name"),
            HandshakeError::Io(e) => write!(f, "I/O error while reading name: {}", e),
            HandshakeError::Timeout(d) => write!(f, "No name received within {:?}", d),
            HandshakeError::TooShort(n) => write!(f, "Name too short ({} bytes)", n),
            HandshakeError::TooLong(n) => write!(f, "Name too long ({} bytes)", n),
            HandshakeError::NotUtf8 => write!(f, "Name is not valid UTF-8"),
            HandshakeError::NotPrintable => write!(f, "Name contains control characters"),
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandshakeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for HandshakeError {
    fn from(error: io::Error) -> Self {
        HandshakeError::Io(error)
    }
}

/// Id allocation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Exhausted,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Exhausted => write!(f, "Client id space exhausted"),
        }
    }
}

impl std::error::Error for IdError {}

/// Fatal errors raised while bringing the server up
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    InvalidAddress(String),
    SocketOption(io::Error),
    Bind { addr: SocketAddr, source: io::Error },
    Listen(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::InvalidAddress(a) => write!(f, "Invalid bind address: {}", a),
            ServerError::SocketOption(e) => write!(f, "setsockopt failed: {}", e),
            ServerError::Bind { addr, source } => {
                write!(f, "Failed to bind to {}: {}", addr, source)
            }
            ServerError::Listen(e) => write!(f, "listen failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Config(e) => Some(e),
            ServerError::SocketOption(e) | ServerError::Listen(e) => Some(e),
            ServerError::Bind { source, .. } => Some(source),
            ServerError::InvalidAddress(_) => None,
        }
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}
