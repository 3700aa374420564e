//! Utility functions
//!
//! Provides logging setup and listener socket utilities.

pub mod logging;
pub mod network;
