//! IPv4 header encoder
//!
//! This module builds the fixed 20-byte IPv4 header (no options) from field
//! values and fills in its header checksum.
//!
//! Features:
//! - Closed protocol number table
//! - DSCP/ECN and flags/fragment-offset sub-field setters with width checks
//! - Header-only packing for callers that append their own payload
//! - Header + payload packing

use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::config::EncoderConfig;
use crate::error::{self, Error, Result};
use crate::network::addr::{self, IntoIpv4};
use crate::network::{checksum, patch_checksum};

pub const IPV4_HEADER_LEN: usize = 20;
const IPV4_VERSION: u8 = 4;
const DEFAULT_IHL: u8 = 5; // 5 * 4 = 20 bytes (standard header length)
pub const DEFAULT_TTL: u8 = 64;
const CHECKSUM_OFFSET: usize = 10;

/// IP protocol numbers carried in the header's protocol field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IpProtocol {
    Hopopt = 0,
    Icmp = 1,
    Igmp = 2,
    Ggp = 3,
    IpInIp = 4,
    St = 5,
    Tcp = 6,
    Cbt = 7,
    Egp = 8,
    Igp = 9,
    Udp = 17,
}

impl IpProtocol {
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IpProtocol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => IpProtocol::Hopopt,
            1 => IpProtocol::Icmp,
            2 => IpProtocol::Igmp,
            3 => IpProtocol::Ggp,
            4 => IpProtocol::IpInIp,
            5 => IpProtocol::St,
            6 => IpProtocol::Tcp,
            7 => IpProtocol::Cbt,
            8 => IpProtocol::Egp,
            9 => IpProtocol::Igp,
            17 => IpProtocol::Udp,
            _ => {
                return Err(Error::UnknownValue {
                    field: "IP protocol",
                    value,
                })
            }
        })
    }
}

/// IPv4 flag values for [`Ipv4Header::set_flags`] (3-bit field)
pub mod flags {
    pub const RESERVED: u8 = 0b100;
    pub const DONT_FRAGMENT: u8 = 0b010;
    pub const MORE_FRAGMENTS: u8 = 0b001;
    pub const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
}

/// IPv4 header encoder
///
/// Holds the field values of the standard 20-byte IPv4 header as defined in
/// RFC 791. Version and header length are fixed; the total length and the
/// checksum are computed by [`Ipv4Header::pack`]. Source and destination
/// addresses have no default and must be set before packing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    tos: u8, // Type of Service
    id: u16,
    flags_frag_offset: u16, // Flags and Fragment Offset
    ttl: u8,                // Time to Live
    protocol: IpProtocol,   // Next Protocol
    src_addr: Option<Ipv4Addr>,
    dst_addr: Option<Ipv4Addr>,
}

impl Ipv4Header {
    /// Create a header for `protocol` with the default field values.
    pub fn new(protocol: IpProtocol) -> Self {
        Self::with_config(protocol, &EncoderConfig::default())
    }

    pub fn with_config(protocol: IpProtocol, config: &EncoderConfig) -> Self {
        Ipv4Header {
            tos: config.tos,
            id: config.identification,
            flags_frag_offset: config.flags_frag_offset,
            ttl: config.ttl,
            protocol,
            src_addr: None,
            dst_addr: None,
        }
    }

    pub fn set_src_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.src_addr = Some(addr.into_ipv4()?);
        Ok(self)
    }

    pub fn set_dst_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.dst_addr = Some(addr.into_ipv4()?);
        Ok(self)
    }

    pub fn set_tos(&mut self, tos: u8) -> &mut Self {
        self.tos = tos;
        self
    }

    /// Set the 6-bit differentiated services code point (upper TOS bits).
    pub fn set_dscp(&mut self, dscp: u8) -> Result<&mut Self> {
        error::check_width("DSCP", dscp as u64, 6)?;
        self.tos = (dscp << 2) | (self.tos & 0b11);
        Ok(self)
    }

    /// Set the 2-bit explicit congestion notification (lower TOS bits).
    pub fn set_ecn(&mut self, ecn: u8) -> Result<&mut Self> {
        error::check_width("ECN", ecn as u64, 2)?;
        self.tos = (self.tos & !0b11) | ecn;
        Ok(self)
    }

    pub fn set_identification(&mut self, id: u16) -> &mut Self {
        self.id = id;
        self
    }

    /// Set the 3-bit flags field, see [`flags`].
    pub fn set_flags(&mut self, value: u8) -> Result<&mut Self> {
        error::check_width("IP flags", value as u64, 3)?;
        self.flags_frag_offset =
            ((value as u16) << 13) | (self.flags_frag_offset & flags::FRAGMENT_OFFSET_MASK);
        Ok(self)
    }

    /// Set the 13-bit fragment offset, in 8-byte units.
    pub fn set_fragment_offset(&mut self, offset: u16) -> Result<&mut Self> {
        error::check_width("fragment offset", offset as u64, 13)?;
        self.flags_frag_offset = (self.flags_frag_offset & !flags::FRAGMENT_OFFSET_MASK) | offset;
        Ok(self)
    }

    pub fn set_flags_frag_offset(&mut self, value: u16) -> &mut Self {
        self.flags_frag_offset = value;
        self
    }

    pub fn set_ttl(&mut self, ttl: u8) -> &mut Self {
        self.ttl = ttl;
        self
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) -> &mut Self {
        self.protocol = protocol;
        self
    }

    pub fn src_addr(&self) -> Option<Ipv4Addr> {
        self.src_addr
    }

    pub fn dst_addr(&self) -> Option<Ipv4Addr> {
        self.dst_addr
    }

    pub fn protocol(&self) -> IpProtocol {
        self.protocol
    }

    pub fn tos(&self) -> u8 {
        self.tos
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn identification(&self) -> u16 {
        self.id
    }

    pub fn flags(&self) -> u8 {
        (self.flags_frag_offset >> 13) as u8
    }

    pub fn fragment_offset(&self) -> u16 {
        self.flags_frag_offset & flags::FRAGMENT_OFFSET_MASK
    }

    /// Both addresses, or the first one missing.
    pub(crate) fn addresses(&self) -> Result<(Ipv4Addr, Ipv4Addr)> {
        Ok((
            addr::require(self.src_addr, "source address")?,
            addr::require(self.dst_addr, "destination address")?,
        ))
    }

    /// Serialize the header for a payload of `payload_len` bytes.
    ///
    /// The total length is `20 + payload_len` and the header checksum is
    /// computed over the 20 bytes with the checksum field zeroed. The payload
    /// itself is not included; append it to the returned header.
    pub fn pack(&self, payload_len: usize) -> Result<[u8; IPV4_HEADER_LEN]> {
        let (src, dst) = self.addresses()?;
        let total_len: u16 = error::narrow(
            "total length",
            IPV4_HEADER_LEN.saturating_add(payload_len),
            u16::MAX as u64,
        )?;

        let mut bytes = [0u8; IPV4_HEADER_LEN];
        bytes[0] = (IPV4_VERSION << 4) | DEFAULT_IHL;
        bytes[1] = self.tos;
        BigEndian::write_u16(&mut bytes[2..4], total_len);
        BigEndian::write_u16(&mut bytes[4..6], self.id);
        BigEndian::write_u16(&mut bytes[6..8], self.flags_frag_offset);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol.value();
        // bytes[10..12] remains 0 for checksum calculation
        bytes[12..16].copy_from_slice(&src.octets());
        bytes[16..20].copy_from_slice(&dst.octets());

        let sum = checksum(&bytes);
        patch_checksum(&mut bytes, CHECKSUM_OFFSET, sum);

        trace!(%src, %dst, total_len, checksum = sum, "packed IPv4 header");
        Ok(bytes)
    }

    /// Create a complete IPv4 packet by combining the header with the payload.
    pub fn pack_with_payload(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let header = self.pack(payload.len())?;
        let mut packet = Vec::with_capacity(IPV4_HEADER_LEN + payload.len());
        packet.extend_from_slice(&header);
        packet.extend_from_slice(payload);
        Ok(packet)
    }
}
