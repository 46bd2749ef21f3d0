//! Network layer protocols implementation
//!
//! This module contains the network layer encoders:
//! - IPv4: Internet Protocol version 4
//! - ICMP: Internet Control Message Protocol
//! - Ping: echo-request sequencing on top of ICMP
//!
//! and the internet checksum shared by every header.

pub mod addr;
pub mod icmp;
pub mod ipv4;
pub mod ping;

use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{self, Result};

// Re-export commonly used items
pub use addr::IntoIpv4;
pub use icmp::{IcmpHeader, IcmpType};
pub use ipv4::{flags, IpProtocol, Ipv4Header};
pub use ping::Ping;

/// Length of the IPv4 pseudo-header used by transport checksums
pub const PSEUDO_HEADER_LEN: usize = 12;

/// Calculate Internet checksum
///
/// Algorithm: Sum data in 16-bit big-endian words, fold the carry bits back
/// into the low 16 bits, and return the one's complement of the result.
/// An odd trailing byte is summed as if followed by a zero byte.
///
/// The checksum field inside `data` must already be zeroed. Running this over
/// a header whose checksum is filled in yields 0.
pub fn checksum(data: &[u8]) -> u16 {
    finish(sum_words(0, data))
}

/// Calculate a transport checksum over the IPv4 pseudo-header and `segment`.
///
/// The pseudo-header is src(4) + dst(4) + zero(1) + protocol(1) +
/// segment length(2). It is only fed to the sum, never materialized in the
/// output.
pub fn pseudo_header_checksum(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    protocol: IpProtocol,
    segment: &[u8],
) -> Result<u16> {
    let segment_len: u16 = error::narrow("segment length", segment.len(), u16::MAX as u64)?;

    let mut pseudo_header = [0u8; PSEUDO_HEADER_LEN];
    pseudo_header[0..4].copy_from_slice(&src.octets());
    pseudo_header[4..8].copy_from_slice(&dst.octets());
    // pseudo_header[8] stays zero
    pseudo_header[9] = protocol.value();
    BigEndian::write_u16(&mut pseudo_header[10..12], segment_len);

    let sum = sum_words(0, &pseudo_header);
    Ok(finish(sum_words(sum, segment)))
}

/// Write `value` big-endian at `offset`, the reserved checksum slot.
pub(crate) fn patch_checksum(buf: &mut [u8], offset: usize, value: u16) {
    BigEndian::write_u16(&mut buf[offset..offset + 2], value);
}

fn sum_words(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum = fold(sum + BigEndian::read_u16(chunk) as u32);
    }

    // Handle odd-length data by padding with zero
    if let [last_byte] = chunks.remainder() {
        sum = fold(sum + ((*last_byte as u32) << 8));
    }

    sum
}

fn fold(mut sum: u32) -> u32 {
    while (sum >> 16) > 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum
}

fn finish(sum: u32) -> u16 {
    !(fold(sum) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_rfc1071_example() {
        // RFC 1071 section 3: the one's complement sum is 0xddf2
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(checksum(&data), !0xddf2u16);
    }

    #[test]
    fn test_checksum_known_ipv4_header() {
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(checksum(&header), 0xb861);
    }

    #[test]
    fn test_checksum_odd_length_pads_with_zero() {
        assert_eq!(checksum(&[0x12, 0x34, 0x56]), checksum(&[0x12, 0x34, 0x56, 0x00]));
        assert_eq!(checksum(&[0xab]), !0xab00u16);
    }

    #[test]
    fn test_checksum_empty_and_all_ones() {
        assert_eq!(checksum(&[]), 0xFFFF);
        // 0xFFFF + 0xFFFF folds back to 0xFFFF, complement is zero and is returned as-is
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF, 0xFF]), 0x0000);
    }

    #[test]
    fn test_checksum_carry_folding() {
        // 0xFFFF + 0x0001 = 0x10000, folds to 0x0001
        assert_eq!(checksum(&[0xFF, 0xFF, 0x00, 0x01]), !0x0001u16);
    }

    #[test]
    fn test_checksum_large_input_does_not_overflow() {
        let data = vec![0xFFu8; 200_000];
        assert_eq!(checksum(&data), 0x0000);
    }

    #[test]
    fn test_self_verification() {
        let mut data = vec![0x45, 0x00, 0x00, 0x1c, 0x12, 0x34, 0x00, 0x00, 0x00, 0x00, 0x99];
        let sum = checksum(&data);
        patch_checksum(&mut data, 8, sum);
        assert_eq!(checksum(&data), 0);
    }

    #[test]
    fn test_pseudo_header_matches_concatenation() {
        let src = Ipv4Addr::new(10, 0, 0, 1);
        let dst = Ipv4Addr::new(10, 0, 0, 2);
        let segment = [0x30, 0x39, 0x00, 0x50, 0xde, 0xad, 0xbe];

        let mut concatenated = Vec::new();
        concatenated.extend_from_slice(&src.octets());
        concatenated.extend_from_slice(&dst.octets());
        concatenated.extend_from_slice(&[0, 6, 0, segment.len() as u8]);
        concatenated.extend_from_slice(&segment);

        let sum = pseudo_header_checksum(src, dst, IpProtocol::Tcp, &segment).unwrap();
        assert_eq!(sum, checksum(&concatenated));
    }

    #[test]
    fn test_pseudo_header_rejects_oversized_segment() {
        let segment = vec![0u8; 70_000];
        let err = pseudo_header_checksum(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::LOCALHOST,
            IpProtocol::Tcp,
            &segment,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValueRange);
    }
}
