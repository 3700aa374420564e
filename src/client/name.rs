//! Display names
//!
//! Parses the raw bytes a client sends during the handshake into a
//! validated `DisplayName`.

use std::fmt;

use crate::error::HandshakeError;

/// Size of the handshake read buffer.
pub const NAME_LEN: usize = 32;

/// Shortest accepted name, in bytes.
pub const MIN_NAME_LEN: usize = 2;

/// Longest accepted name, in bytes. Leaves room for a terminator inside
/// `NAME_LEN - 1`.
pub const MAX_NAME_LEN: usize = NAME_LEN - 2;

/// A validated client display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Parses the bytes of a single handshake read.
    ///
    /// The name ends at the first line feed or NUL byte; surrounding
    /// whitespace, carriage returns included, is trimmed before the length
    /// checks.
    pub fn parse(raw: &[u8]) -> Result<Self, HandshakeError> {
        let end = raw
            .iter()
            .position(|&b| b == b'\n' || b == 0)
            .unwrap_or(raw.len());
        let text = std::str::from_utf8(&raw[..end]).map_err(|_| HandshakeError::NotUtf8)?;
        let name = text.trim();

        if name.len() < MIN_NAME_LEN {
            return Err(HandshakeError::TooShort(name.len()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(HandshakeError::TooLong(name.len()));
        }
        if name.chars().any(char::is_control) {
            return Err(HandshakeError::NotPrintable);
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
