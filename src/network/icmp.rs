//! ICMP (Internet Control Message Protocol) encoder
//!
//! This module builds ICMP messages: the 8-byte header followed by an opaque
//! payload, checksummed over both. The encoder also carries the companion
//! IPv4 header so a full datagram can be produced in one call.

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::config::EncoderConfig;
use crate::error::{Error, Result};
use crate::network::addr::IntoIpv4;
use crate::network::ipv4::{IpProtocol, Ipv4Header};
use crate::network::{checksum, patch_checksum};

/// ICMP header length in bytes
pub const ICMP_HEADER_LEN: usize = 8;
const CHECKSUM_OFFSET: usize = 2;

/// ICMP message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    Redirect = 5,
    EchoRequest = 8,
    RouterAdvertisement = 9,
    RouterSolicitation = 10,
    TimeExceeded = 11,
    ParameterProblem = 12,
    Timestamp = 13,
    TimestampReply = 14,
}

impl IcmpType {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Check if this is an Echo Request or Echo Reply message
    pub fn is_echo(self) -> bool {
        matches!(self, IcmpType::EchoRequest | IcmpType::EchoReply)
    }
}

impl TryFrom<u8> for IcmpType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => IcmpType::EchoReply,
            3 => IcmpType::DestinationUnreachable,
            5 => IcmpType::Redirect,
            8 => IcmpType::EchoRequest,
            9 => IcmpType::RouterAdvertisement,
            10 => IcmpType::RouterSolicitation,
            11 => IcmpType::TimeExceeded,
            12 => IcmpType::ParameterProblem,
            13 => IcmpType::Timestamp,
            14 => IcmpType::TimestampReply,
            _ => {
                return Err(Error::UnknownValue {
                    field: "ICMP type",
                    value,
                })
            }
        })
    }
}

/// ICMP message encoder
///
/// Represents the standard 8-byte ICMP header as defined in RFC 792 plus its
/// payload. The 4-byte `rest` field is type-specific and written as given;
/// splitting it into identifier and sequence for echo messages is up to the
/// caller (see [`crate::Ping`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpHeader {
    msg_type: IcmpType,
    msg_code: u8,
    rest: [u8; 4], // Type-specific data
    payload: Vec<u8>,
    ip: Ipv4Header,
}

impl IcmpHeader {
    pub fn new(msg_type: IcmpType, payload: impl Into<Vec<u8>>) -> Self {
        Self::with_config(msg_type, payload, &EncoderConfig::default())
    }

    pub fn with_config(
        msg_type: IcmpType,
        payload: impl Into<Vec<u8>>,
        config: &EncoderConfig,
    ) -> Self {
        IcmpHeader {
            msg_type,
            msg_code: 0,
            rest: [0; 4],
            payload: payload.into(),
            ip: Ipv4Header::with_config(IpProtocol::Icmp, config),
        }
    }

    /// Set the source address of the companion IPv4 header.
    ///
    /// ICMP has no pseudo-header; the address only matters for
    /// [`IcmpHeader::pack_datagram`].
    pub fn set_src_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.ip.set_src_ip(addr)?;
        Ok(self)
    }

    /// Set the destination address of the companion IPv4 header.
    pub fn set_dst_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.ip.set_dst_ip(addr)?;
        Ok(self)
    }

    pub fn set_type(&mut self, msg_type: IcmpType) -> &mut Self {
        self.msg_type = msg_type;
        self
    }

    pub fn set_code(&mut self, code: u8) -> &mut Self {
        self.msg_code = code;
        self
    }

    /// Set the 4-byte type-specific field from a big-endian word.
    pub fn set_rest(&mut self, rest: u32) -> &mut Self {
        BigEndian::write_u32(&mut self.rest, rest);
        self
    }

    pub fn set_rest_bytes(&mut self, rest: [u8; 4]) -> &mut Self {
        self.rest = rest;
        self
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) -> &mut Self {
        self.payload = payload.into();
        self
    }

    pub fn msg_type(&self) -> IcmpType {
        self.msg_type
    }

    pub fn code(&self) -> u8 {
        self.msg_code
    }

    pub fn rest(&self) -> u32 {
        BigEndian::read_u32(&self.rest)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn ip(&self) -> &Ipv4Header {
        &self.ip
    }

    /// The companion IPv4 header, for changing any of its fields.
    pub fn ip_mut(&mut self) -> &mut Ipv4Header {
        &mut self.ip
    }

    /// Serialize header + payload with the checksum filled in.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut message = Vec::with_capacity(ICMP_HEADER_LEN + self.payload.len());
        message.push(self.msg_type.value());
        message.push(self.msg_code);
        message.extend_from_slice(&[0, 0]); // checksum, zero while summing
        message.extend_from_slice(&self.rest);
        message.extend_from_slice(&self.payload);

        let sum = checksum(&message);
        patch_checksum(&mut message, CHECKSUM_OFFSET, sum);

        trace!(
            msg_type = ?self.msg_type,
            len = message.len(),
            checksum = sum,
            "packed ICMP message"
        );
        Ok(message)
    }

    /// Serialize the IPv4 header followed by the ICMP message.
    pub fn pack_datagram(&self) -> Result<Vec<u8>> {
        let message = self.pack()?;
        self.ip.pack_with_payload(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ipv4::IPV4_HEADER_LEN;
    use crate::ErrorKind;

    #[test]
    fn test_echo_request_layout() {
        let mut icmp = IcmpHeader::new(IcmpType::EchoRequest, b"abcdefgh".to_vec());
        icmp.set_rest(0x1234_0001);

        let message = icmp.pack().unwrap();
        assert_eq!(message.len(), ICMP_HEADER_LEN + 8);
        assert_eq!(message[0], 8);
        assert_eq!(message[1], 0);
        assert_eq!(&message[4..8], &[0x12, 0x34, 0x00, 0x01]);
        assert_eq!(&message[8..], b"abcdefgh");
        assert_eq!(checksum(&message), 0);
    }

    #[test]
    fn test_known_checksum() {
        // Echo request, id 1, seq 1, no payload: 0x0800 + 0x0001 + 0x0001
        let mut icmp = IcmpHeader::new(IcmpType::EchoRequest, Vec::<u8>::new());
        icmp.set_rest_bytes([0, 1, 0, 1]);

        let message = icmp.pack().unwrap();
        assert_eq!(message, [0x08, 0x00, 0xf7, 0xfd, 0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_checksum_covers_odd_payload() {
        let mut icmp = IcmpHeader::new(IcmpType::EchoReply, b"xyz".to_vec());
        let with_payload = icmp.pack().unwrap();
        assert_eq!(checksum(&with_payload), 0);

        icmp.set_payload(b"xy".to_vec());
        assert_ne!(icmp.pack().unwrap()[2..4], with_payload[2..4]);
    }

    #[test]
    fn test_pack_without_addresses() {
        // ICMP has no pseudo-header, only the datagram needs addresses
        let icmp = IcmpHeader::new(IcmpType::Timestamp, Vec::<u8>::new());
        assert!(icmp.pack().is_ok());

        let err = icmp.pack_datagram().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_addresses_do_not_affect_checksum() {
        let mut a = IcmpHeader::new(IcmpType::EchoRequest, b"ping".to_vec());
        a.set_src_ip("10.0.0.1").unwrap().set_dst_ip("10.0.0.2").unwrap();
        let mut b = a.clone();
        b.set_src_ip("172.16.0.9").unwrap();

        assert_eq!(a.pack().unwrap(), b.pack().unwrap());
    }

    #[test]
    fn test_pack_datagram() {
        let mut icmp = IcmpHeader::new(IcmpType::EchoRequest, b"abcdefgh".to_vec());
        icmp.set_src_ip("192.168.0.1").unwrap();
        icmp.set_dst_ip("8.8.8.8").unwrap();
        icmp.ip_mut().set_ttl(255);

        let datagram = icmp.pack_datagram().unwrap();
        let (ip, message) = datagram.split_at(IPV4_HEADER_LEN);

        assert_eq!(datagram.len(), IPV4_HEADER_LEN + ICMP_HEADER_LEN + 8);
        assert_eq!(BigEndian::read_u16(&ip[2..4]) as usize, datagram.len());
        assert_eq!(ip[8], 255);
        assert_eq!(ip[9], IpProtocol::Icmp.value());
        assert_eq!(checksum(ip), 0);
        assert_eq!(message, icmp.pack().unwrap().as_slice());
    }

    #[test]
    fn test_code_and_type() {
        let mut icmp = IcmpHeader::new(IcmpType::DestinationUnreachable, Vec::<u8>::new());
        icmp.set_code(3).set_type(IcmpType::TimeExceeded);

        let message = icmp.pack().unwrap();
        assert_eq!(&message[0..2], &[11, 3]);
        assert_eq!(icmp.code(), 3);
        assert_eq!(icmp.msg_type(), IcmpType::TimeExceeded);
    }

    #[test]
    fn test_type_table() {
        assert_eq!(IcmpType::try_from(0).unwrap(), IcmpType::EchoReply);
        assert_eq!(IcmpType::try_from(8).unwrap(), IcmpType::EchoRequest);
        assert_eq!(IcmpType::TimestampReply.value(), 14);
        assert!(IcmpType::EchoReply.is_echo());
        assert!(!IcmpType::Redirect.is_echo());

        let err = IcmpType::try_from(42).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueRange);
    }
}
