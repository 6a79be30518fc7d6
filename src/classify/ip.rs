//! IPv4/IPv6 (layer 3) datagram parsing.
//!
//! Both parsers are deliberately minimal: they extract exactly what packet
//! classification needs (the transport protocol byte, the addresses, and the
//! payload slice) and discard everything else. IPv6 extension headers are not
//! walked; a datagram whose next-header is not directly UDP is treated as
//! non-matching traffic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IP protocol number for UDP.
pub const PROTOCOL_UDP: u8 = 17;

/// Minimum IPv4 header length (IHL = 5).
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Fixed IPv6 header length.
pub const IPV6_HEADER_LEN: usize = 40;

/// A parsed IP datagram, version-agnostic at the transport boundary.
///
/// `protocol` is the IPv4 protocol byte or the IPv6 next-header byte.
#[derive(Debug, PartialEq, Eq)]
pub struct IpDatagram<'a> {
    pub protocol: u8,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub payload: &'a [u8],
}

/// Parse an IPv4 datagram.
///
/// Verifies the version nibble and derives the header length from the IHL
/// nibble (in 32-bit words). Returns `None` on truncation, a wrong version,
/// or an IHL that runs past the buffer.
pub fn parse_ipv4(data: &[u8]) -> Option<IpDatagram<'_>> {
    if data.len() < IPV4_MIN_HEADER_LEN {
        return None;
    }

    let version = (data[0] >> 4) & 0x0F;
    if version != 4 {
        return None;
    }

    let header_len = ((data[0] & 0x0F) as usize) * 4;
    if header_len < IPV4_MIN_HEADER_LEN || header_len > data.len() {
        return None;
    }

    let protocol = data[9];
    let src: [u8; 4] = data[12..16].try_into().ok()?;
    let dst: [u8; 4] = data[16..20].try_into().ok()?;

    Some(IpDatagram {
        protocol,
        src: IpAddr::V4(Ipv4Addr::from(src)),
        dst: IpAddr::V4(Ipv4Addr::from(dst)),
        payload: &data[header_len..],
    })
}

/// Parse an IPv6 datagram using the fixed 40-byte header.
pub fn parse_ipv6(data: &[u8]) -> Option<IpDatagram<'_>> {
    if data.len() < IPV6_HEADER_LEN {
        return None;
    }

    let version = (data[0] >> 4) & 0x0F;
    if version != 6 {
        return None;
    }

    let next_header = data[6];
    let src: [u8; 16] = data[8..24].try_into().ok()?;
    let dst: [u8; 16] = data[24..40].try_into().ok()?;

    Some(IpDatagram {
        protocol: next_header,
        src: IpAddr::V6(Ipv6Addr::from(src)),
        dst: IpAddr::V6(Ipv6Addr::from(dst)),
        payload: &data[IPV6_HEADER_LEN..],
    })
}
