//! TCP (Transmission Control Protocol) segment encoder
//!
//! This module builds the fixed 20-byte TCP header (no options) followed by
//! its payload, with the checksum computed over the IPv4 pseudo-header.

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::config::EncoderConfig;
use crate::error::{self, Result};
use crate::network::addr::IntoIpv4;
use crate::network::ipv4::{IpProtocol, Ipv4Header};
use crate::network::{patch_checksum, pseudo_header_checksum};

pub const TCP_HEADER_LEN: usize = 20;
const DEFAULT_DATA_OFFSET: u16 = 5; // 5 * 4 = 20 bytes
pub const DEFAULT_WINDOW: u16 = 65535;
const CHECKSUM_OFFSET: usize = 16;

/// TCP flag bits within the data-offset/flags word
pub mod flags {
    pub const FIN: u16 = 0x0001;
    pub const SYN: u16 = 0x0002;
    pub const RST: u16 = 0x0004;
    pub const PSH: u16 = 0x0008;
    pub const ACK: u16 = 0x0010;
    pub const URG: u16 = 0x0020;
    pub const ECE: u16 = 0x0040;
    pub const CWR: u16 = 0x0080;
    pub const NS: u16 = 0x0100;
    pub const MASK: u16 = 0x01FF;
}

/// TCP segment encoder
///
/// Represents the standard 20-byte TCP header as defined in RFC 793 plus its
/// payload. The companion IPv4 header supplies the addresses for the
/// pseudo-header checksum, so both must be set before packing even though
/// they are not part of the segment bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    src_port: u16,
    dst_port: u16,
    seq_number: u32,
    ack_number: u32,
    flags: u16,
    window_size: u16,
    urgent_ptr: u16,
    payload: Vec<u8>,
    ip: Ipv4Header,
}

impl TcpHeader {
    /// Create an encoder with a random initial sequence number.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self::with_config(payload, &EncoderConfig::default())
    }

    pub fn with_config(payload: impl Into<Vec<u8>>, config: &EncoderConfig) -> Self {
        TcpHeader {
            src_port: 0,
            dst_port: 0,
            seq_number: rand::random::<u32>(),
            ack_number: 0,
            flags: 0,
            window_size: config.window,
            urgent_ptr: 0,
            payload: payload.into(),
            ip: Ipv4Header::with_config(IpProtocol::Tcp, config),
        }
    }

    /// Set the source address used in the pseudo-header and IPv4 header.
    pub fn set_src_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.ip.set_src_ip(addr)?;
        Ok(self)
    }

    /// Set the destination address used in the pseudo-header and IPv4 header.
    pub fn set_dst_ip<A: IntoIpv4>(&mut self, addr: A) -> Result<&mut Self> {
        self.ip.set_dst_ip(addr)?;
        Ok(self)
    }

    pub fn set_src_port<P>(&mut self, port: P) -> Result<&mut Self>
    where
        P: TryInto<u16> + Copy + std::fmt::Display,
    {
        self.src_port = error::narrow("source port", port, u16::MAX as u64)?;
        Ok(self)
    }

    pub fn set_dst_port<P>(&mut self, port: P) -> Result<&mut Self>
    where
        P: TryInto<u16> + Copy + std::fmt::Display,
    {
        self.dst_port = error::narrow("destination port", port, u16::MAX as u64)?;
        Ok(self)
    }

    pub fn set_sequence(&mut self, seq: u32) -> &mut Self {
        self.seq_number = seq;
        self
    }

    pub fn set_ack_number(&mut self, ack: u32) -> &mut Self {
        self.ack_number = ack;
        self
    }

    pub fn set_window(&mut self, window: u16) -> &mut Self {
        self.window_size = window;
        self
    }

    pub fn set_urgent_ptr(&mut self, urgent: u16) -> &mut Self {
        self.urgent_ptr = urgent;
        self
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) -> &mut Self {
        self.payload = payload.into();
        self
    }

    /// Set or clear flag bits from [`flags`], leaving the others alone.
    ///
    /// Bits outside [`flags::MASK`] have no place in the header and are
    /// rejected with `OutOfRange`.
    pub fn set_flag(&mut self, flag: u16, on: bool) -> Result<&mut Self> {
        error::check_width("TCP flags", flag as u64, flags::MASK.count_ones())?;
        Ok(self.toggle(flag, on))
    }

    fn toggle(&mut self, flag: u16, on: bool) -> &mut Self {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
        self
    }

    pub fn set_urg(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::URG, on)
    }

    pub fn set_ack(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::ACK, on)
    }

    pub fn set_psh(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::PSH, on)
    }

    pub fn set_rst(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::RST, on)
    }

    pub fn set_syn(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::SYN, on)
    }

    pub fn set_fin(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::FIN, on)
    }

    pub fn set_ece(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::ECE, on)
    }

    pub fn set_cwr(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::CWR, on)
    }

    pub fn set_ns(&mut self, on: bool) -> &mut Self {
        self.toggle(flags::NS, on)
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        (self.flags & flag) != 0
    }

    /// Check if SYN flag is set
    pub fn is_syn(&self) -> bool {
        self.has_flag(flags::SYN)
    }

    /// Check if ACK flag is set
    pub fn is_ack(&self) -> bool {
        self.has_flag(flags::ACK)
    }

    /// Check if FIN flag is set
    pub fn is_fin(&self) -> bool {
        self.has_flag(flags::FIN)
    }

    /// Check if RST flag is set
    pub fn is_rst(&self) -> bool {
        self.has_flag(flags::RST)
    }

    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn sequence(&self) -> u32 {
        self.seq_number
    }

    pub fn window(&self) -> u16 {
        self.window_size
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
    ///
    /// The checksum covers the pseudo-header (addresses, protocol, segment
    /// length) followed by the segment; the pseudo-header is not returned.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let (src, dst) = self.ip.addresses()?;

        let mut segment = Vec::with_capacity(TCP_HEADER_LEN + self.payload.len());
        segment.extend_from_slice(&self.header_bytes());
        segment.extend_from_slice(&self.payload);

        let sum = pseudo_header_checksum(src, dst, IpProtocol::Tcp, &segment)?;
        patch_checksum(&mut segment, CHECKSUM_OFFSET, sum);

        trace!(
            src_port = self.src_port,
            dst_port = self.dst_port,
            len = segment.len(),
            checksum = sum,
            "packed TCP segment"
        );
        Ok(segment)
    }

    /// Serialize the IPv4 header followed by the TCP segment.
    pub fn pack_datagram(&self) -> Result<Vec<u8>> {
        let segment = self.pack()?;
        self.ip.pack_with_payload(&segment)
    }

    /// The 20 header bytes with the checksum field zeroed.
    fn header_bytes(&self) -> [u8; TCP_HEADER_LEN] {
        let mut bytes = [0u8; TCP_HEADER_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.src_port);
        BigEndian::write_u16(&mut bytes[2..4], self.dst_port);
        BigEndian::write_u32(&mut bytes[4..8], self.seq_number);
        BigEndian::write_u32(&mut bytes[8..12], self.ack_number);
        BigEndian::write_u16(&mut bytes[12..14], (DEFAULT_DATA_OFFSET << 12) | self.flags);
        BigEndian::write_u16(&mut bytes[14..16], self.window_size);
        // bytes[16..18] remains 0 for checksum calculation
        BigEndian::write_u16(&mut bytes[18..20], self.urgent_ptr);
        bytes
    }
}
