//! Client identities
//!
//! `UidAllocator` hands out `ClientId`s in strictly increasing order. It is
//! owned by the accept loop and only usable through `&mut`, so ids are
//! always issued from a single task.

use std::fmt;

use crate::error::IdError;

/// First id handed out by a fresh allocator.
pub const FIRST_CLIENT_ID: u64 = 10;

/// An id for a connected client. Unique within the server process.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic source of client ids.
#[derive(Debug)]
pub struct UidAllocator {
    next: u64,
}

impl UidAllocator {
    pub fn new() -> Self {
        Self::starting_at(FIRST_CLIENT_ID)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Returns the current id and advances the counter.
    pub fn next(&mut self) -> Result<ClientId, IdError> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or(IdError::Exhausted)?;
        Ok(ClientId(id))
    }
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
