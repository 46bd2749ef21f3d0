//! Byte-exact IPv4, ICMP and TCP header encoding
//!
//! This library builds raw network-layer packets from field values:
//! - IPv4 header encoding with header checksum
//! - ICMP message encoding, and a ping helper that sequences echo requests
//! - TCP segment encoding with the pseudo-header checksum
//! - Sinks that hand finished datagrams to a raw socket or TUN device
//!
//! Encoders are plain builders: set fields in any order, then call `pack`.
//! Packing never mutates the encoder (only [`Ping`] advances its sequence)
//! and fails with a typed [`Error`] when a required address is missing or a
//! value does not fit its field.

pub mod config;
pub mod error;
pub mod iface;
pub mod network;
pub mod transport;

// Re-export commonly used types
pub use config::EncoderConfig;
pub use error::{Error, ErrorKind, Result};
pub use iface::{PacketSink, RawSocket, TunSink};
pub use network::icmp::{IcmpHeader, IcmpType};
pub use network::ipv4::{IpProtocol, Ipv4Header};
pub use network::ping::Ping;
pub use network::{checksum, pseudo_header_checksum, IntoIpv4};
pub use transport::tcp::TcpHeader;
