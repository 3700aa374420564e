//! Network utilities
//!
//! Listener socket setup.

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket};

use crate::error::ServerError;

/// Create a listener on `addr` with address reuse enabled.
pub fn bind_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, ServerError> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(ServerError::SocketOption)?;

    socket
        .set_reuseaddr(true)
        .map_err(ServerError::SocketOption)?;
    #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
    socket
        .set_reuseport(true)
        .map_err(ServerError::SocketOption)?;

    socket
        .bind(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;

    socket.listen(backlog).map_err(ServerError::Listen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn unavailable_address_is_a_bind_error() {
        // TEST-NET-1 is never assigned to a local interface.
        let addr: SocketAddr = "192.0.2.1:0".parse().unwrap();
        assert!(matches!(
            bind_listener(addr, 16),
            Err(ServerError::Bind { .. })
        ));
    }
}
