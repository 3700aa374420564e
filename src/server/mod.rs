//! Server core functionality
//!
//! The accept loop, its admission control and accept throttling.

pub mod core;
pub mod throttle;

pub use self::core::Server;
pub use throttle::AcceptThrottle;
