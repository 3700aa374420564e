//! Error handlers
//!
//! Reports fatal errors and maps them to process exit codes.

use crate::error::types::ServerError;
use log::error;

/// Log a fatal startup error
pub fn handle_error(err: &ServerError) {
    error!("ERROR: {}", err);
}

/// Convert a startup error to the process exit status
pub fn error_to_exit_code(err: &ServerError) -> u8 {
    match err {
        ServerError::Config(_)
        | ServerError::InvalidAddress(_)
        | ServerError::SocketOption(_)
        | ServerError::Bind { .. }
        | ServerError::Listen(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn every_startup_failure_exits_with_one() {
        let errors = [
            ServerError::InvalidAddress("nowhere".into()),
            ServerError::SocketOption(io::Error::other("reuseaddr")),
            ServerError::Bind {
                addr: "127.0.0.1:1".parse().unwrap(),
                source: io::Error::from(io::ErrorKind::AddrInUse),
            },
            ServerError::Listen(io::Error::other("listen")),
        ];
        for err in &errors {
            assert_eq!(error_to_exit_code(err), 1, "{}", err);
        }
    }
}
