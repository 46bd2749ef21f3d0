//! Transport layer protocols implementation
//!
//! This module contains encoders for transport layer protocols:
//! - TCP: Transmission Control Protocol

pub mod tcp;

// Re-export commonly used items
pub use tcp::{flags, TcpHeader};
