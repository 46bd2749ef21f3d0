//! Packet sinks
//!
//! Encoders only produce bytes. This module hands finished IPv4 datagrams to
//! the operating system:
//! - Raw IPv4 socket with the header supplied by the caller
//! - TUN device

pub mod raw;
pub mod tun;

use std::io;
use std::net::Ipv4Addr;

pub use raw::RawSocket;
pub use tun::TunSink;

/// Destination for complete IPv4 datagrams.
///
/// Errors from the underlying device are returned unchanged; nothing here
/// retries.
pub trait PacketSink {
    /// Send `packet`, which already starts with its IPv4 header, towards `dst`.
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize>;
}

impl<S: PacketSink + ?Sized> PacketSink for &mut S {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        (**self).send_packet(packet, dst)
    }
}

impl<S: PacketSink + ?Sized> PacketSink for Box<S> {
    fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        (**self).send_packet(packet, dst)
    }
}
