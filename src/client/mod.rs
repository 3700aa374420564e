//! Client management
//!
//! Client identities, records, the bounded registry and the per-connection
//! worker that runs the name handshake.

pub mod handler;
pub mod id;
pub mod name;
pub mod registry;
pub mod state;

pub use handler::{ConnectionWorker, HandshakeOutcome, WorkerContext, WorkerCounter, WorkerExit};
pub use id::{ClientId, UidAllocator};
pub use name::DisplayName;
pub use registry::{ClientRegistry, MAX_CLIENTS};
pub use state::{ClientRecord, WorkerState};
