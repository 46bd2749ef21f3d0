//! Echo-request generator with automatic identifier and sequence handling.

use tracing::debug;

use crate::config::EncoderConfig;
use crate::error::Result;
use crate::iface::PacketSink;
use crate::network::addr::IntoIpv4;
use crate::network::icmp::{IcmpHeader, IcmpType};
use crate::network::ipv4::Ipv4Header;

/// Echo payload used when none is given
pub const DEFAULT_PAYLOAD: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds successive ICMP echo requests for one destination.
///
/// The identifier is fixed when the `Ping` is created. The sequence starts at
/// zero and is advanced by one before every successful [`Ping::pack`], so the
/// first request carries sequence 1. There is no way to rewind it.
///
/// A `Ping` is not synchronized; share it between senders only behind a lock.
#[derive(Debug, Clone)]
pub struct Ping {
    icmp: IcmpHeader,
    identifier: u16,
    sequence: u16,
}

impl Ping {
    /// Create a ping with a random identifier and the alphabet payload.
    pub fn new() -> Self {
        Self::with_config(&EncoderConfig::default())
    }

    pub fn with_config(config: &EncoderConfig) -> Self {
        Self::build(rand::random::<u16>(), config.ping_payload.clone(), config)
    }

    pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self::build(rand::random::<u16>(), payload.into(), &EncoderConfig::default())
    }

    /// Create a ping with a caller-chosen identifier.
    pub fn with_identifier(identifier: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self::build(identifier, payload.into(), &EncoderConfig::default())
    }

    fn build(identifier: u16, mut payload: Vec<u8>, config: &EncoderConfig) -> Self {
        // keep the message an even number of bytes
        if payload.len() % 2 != 0 {
            payload.push(b' ');
        }

        let mut icmp = IcmpHeader::with_config(IcmpType::EchoRequest, payload, config);
        icmp.set_rest(echo_rest(identifier, 0));

        Ping {
            icmp,
            identifier,
            sequence: 0,
        }
    }

    pub fn set_src_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.icmp.set_src_ip(addr)?;
        Ok(self)
    }

    pub fn set_dst_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.icmp.set_dst_ip(addr)?;
        Ok(self)
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// Sequence number carried by the most recent request, 0 before the first.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn payload(&self) -> &[u8] {
        self.icmp.payload()
    }

    /// The IPv4 header wrapped around every request.
    pub fn ip_mut(&mut self) -> &mut Ipv4Header {
        self.icmp.ip_mut()
    }

    /// Build the next echo request as a complete IPv4 datagram.
    ///
    /// The sequence number advances only if packing succeeds.
    pub fn pack(&mut self) -> Result<Vec<u8>> {
        let next = self.sequence.wrapping_add(1);
        self.icmp.set_rest(echo_rest(self.identifier, next));

        let datagram = match self.icmp.pack_datagram() {
            Ok(datagram) => datagram,
            Err(e) => {
                self.icmp.set_rest(echo_rest(self.identifier, self.sequence));
                return Err(e);
            }
        };

        self.sequence = next;
        debug!(
            identifier = self.identifier,
            sequence = self.sequence,
            "built echo request"
        );
        Ok(datagram)
    }

    /// Pack the next echo request and hand it to `sink`.
    ///
    /// Returns the sequence number that was sent. A sink failure is returned
    /// as is; the sequence number has already been consumed by then.
    pub fn send<S: PacketSink + ?Sized>(&mut self, sink: &mut S) -> Result<u16> {
        let datagram = self.pack()?;
        let dst = self.icmp.ip().addresses()?.1;
        sink.send_packet(&datagram, dst)?;
        Ok(self.sequence)
    }
}

impl Default for Ping {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier in the high 16 bits, sequence in the low 16 bits.
fn echo_rest(identifier: u16, sequence: u16) -> u32 {
    ((identifier as u32) << 16) | sequence as u32
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::Ipv4Addr;

    use byteorder::{BigEndian, ByteOrder};

    use super::*;
    use crate::network::checksum;
    use crate::network::ipv4::IPV4_HEADER_LEN;
    use crate::ErrorKind;

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<(Vec<u8>, Ipv4Addr)>,
    }

    impl PacketSink for RecordingSink {
        fn send_packet(&mut self, packet: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
            self.sent.push((packet.to_vec(), dst));
            Ok(packet.len())
        }
    }

    struct FailingSink;

    impl PacketSink for FailingSink {
        fn send_packet(&mut self, _packet: &[u8], _dst: Ipv4Addr) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "raw socket"))
        }
    }

    fn addressed(identifier: u16) -> Ping {
        let mut ping = Ping::with_identifier(identifier, DEFAULT_PAYLOAD);
        ping.set_src_ip("192.168.0.1").unwrap();
        ping.set_dst_ip("8.8.8.8").unwrap();
        ping
    }

    fn rest_of(datagram: &[u8]) -> u32 {
        BigEndian::read_u32(&datagram[IPV4_HEADER_LEN + 4..IPV4_HEADER_LEN + 8])
    }

    #[test]
    fn test_fresh_state() {
        let ping = addressed(0xABCD);
        assert_eq!(ping.identifier(), 0xABCD);
        assert_eq!(ping.sequence(), 0);
        assert_eq!(ping.payload(), DEFAULT_PAYLOAD);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut ping = addressed(0x1234);

        for n in 1..=5u32 {
            let datagram = ping.pack().unwrap();
            let rest = rest_of(&datagram);
            assert_eq!(rest >> 16, 0x1234);
            assert_eq!(rest & 0xFFFF, n);
            assert_eq!(ping.sequence() as u32, n);
        }
    }

    #[test]
    fn test_sequence_wraps() {
        let mut ping = addressed(7);
        ping.sequence = u16::MAX;

        let datagram = ping.pack().unwrap();
        assert_eq!(rest_of(&datagram), 7 << 16);
        assert_eq!(ping.sequence(), 0);
    }

    #[test]
    fn test_datagram_is_checksummed() {
        let mut ping = addressed(99);
        let datagram = ping.pack().unwrap();
        let (ip, message) = datagram.split_at(IPV4_HEADER_LEN);

        assert_eq!(ip[9], 1);
        assert_eq!(BigEndian::read_u16(&ip[2..4]) as usize, datagram.len());
        assert_eq!(checksum(ip), 0);
        assert_eq!(message[0], IcmpType::EchoRequest.value());
        assert_eq!(checksum(message), 0);
        assert_eq!(&message[8..], DEFAULT_PAYLOAD);
    }

    #[test]
    fn test_odd_payload_is_padded() {
        let ping = Ping::with_identifier(1, b"abc".to_vec());
        assert_eq!(ping.payload(), b"abc ");

        let ping = Ping::with_payload(b"abcd".to_vec());
        assert_eq!(ping.payload(), b"abcd");
    }

    #[test]
    fn test_failed_pack_does_not_advance() {
        let mut ping = Ping::with_identifier(5, DEFAULT_PAYLOAD);
        ping.set_src_ip("10.0.0.1").unwrap();

        let err = ping.pack().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(ping.sequence(), 0);

        ping.set_dst_ip("10.0.0.2").unwrap();
        let datagram = ping.pack().unwrap();
        assert_eq!(rest_of(&datagram), (5 << 16) | 1);
    }

    #[test]
    fn test_send_uses_destination() {
        let mut ping = addressed(42);
        let mut sink = RecordingSink::default();

        assert_eq!(ping.send(&mut sink).unwrap(), 1);
        assert_eq!(ping.send(&mut sink).unwrap(), 2);

        assert_eq!(sink.sent.len(), 2);
        assert_eq!(sink.sent[0].1, Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(rest_of(&sink.sent[1].0), (42 << 16) | 2);
    }

    #[test]
    fn test_send_surfaces_sink_error() {
        let mut ping = addressed(42);
        let err = ping.send(&mut FailingSink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transmission);
        assert_eq!(ping.sequence(), 1);
    }

    #[test]
    fn test_config_payload_and_ttl() {
        let config = EncoderConfig {
            ttl: 32,
            ping_payload: b"xyz".to_vec(),
            ..EncoderConfig::default()
        };
        let mut ping = Ping::with_config(&config);
        ping.set_src_ip("10.0.0.1").unwrap();
        ping.set_dst_ip("10.0.0.2").unwrap();

        let datagram = ping.pack().unwrap();
        assert_eq!(datagram[8], 32);
        assert_eq!(&datagram[IPV4_HEADER_LEN + 8..], b"xyz ");
    }
}
