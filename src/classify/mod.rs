//! Layered packet classification.
//!
//! Turns raw capture buffers into protocol-candidate payloads in four steps:
//! link layer (Ethernet, skipped for raw-IP interfaces), network layer
//! (IPv4/IPv6), transport layer (UDP), and the port-or-signature heuristic.
//! Every step rejects malformed input by returning `None`; classification
//! never panics and never logs above `trace` so foreign traffic stays cheap.

pub mod ethernet;
pub mod heuristic;
pub mod ip;
pub mod udp;

use tracing::trace;

use ethernet::{ETHERTYPE_IPV4, ETHERTYPE_IPV6, EthernetFrame};
use ip::{IpDatagram, PROTOCOL_UDP};
use udp::UdpDatagram;

/// How the link layer of a capture buffer should be interpreted.
///
/// Tunnel-style interfaces (mobile routers, VPN adapters) hand the capture
/// layer bare IP datagrams with no Ethernet framing; for those the classifier
/// starts directly at the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    #[default]
    Ethernet,
    RawIp,
}

/// Transient view of a packet that survived all classification steps.
///
/// Borrows the capture buffer; callers copy `payload` only once they decide
/// to forward it into the pipeline.
#[derive(Debug, PartialEq, Eq)]
pub struct ClassifiedPacket<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub payload: &'a [u8],
}

/// Stateless packet classifier configured with the target UDP port set.
#[derive(Debug, Clone)]
pub struct Classifier {
    ports: Vec<u16>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(heuristic::DEFAULT_UDP_PORTS.to_vec())
    }
}

impl Classifier {
    /// Create a classifier matching the given UDP port set (in addition to
    /// the magic-byte signature, which always applies).
    pub fn new(ports: Vec<u16>) -> Self {
        Self { ports }
    }

    /// The configured target port set.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Classify one capture buffer.
    ///
    /// Returns the UDP payload view when the packet parses cleanly down to
    /// UDP and matches the protocol heuristic, `None` otherwise.
    pub fn classify<'a>(&self, mode: LinkMode, data: &'a [u8]) -> Option<ClassifiedPacket<'a>> {
        let datagram = match mode {
            LinkMode::Ethernet => {
                let frame = EthernetFrame::parse(data)?;
                match frame.ethertype {
                    ETHERTYPE_IPV4 => ip::parse_ipv4(frame.payload)?,
                    ETHERTYPE_IPV6 => ip::parse_ipv6(frame.payload)?,
                    _ => return None,
                }
            }
            LinkMode::RawIp => Self::parse_raw_ip(data)?,
        };

        if datagram.protocol != PROTOCOL_UDP {
            return None;
        }

        let udp = UdpDatagram::parse(datagram.payload)?;
        if !heuristic::is_protocol_datagram(&self.ports, udp.src_port, udp.dst_port, udp.payload) {
            return None;
        }

        trace!(
            src_port = udp.src_port,
            dst_port = udp.dst_port,
            len = udp.payload.len(),
            "classified protocol datagram"
        );

        Some(ClassifiedPacket {
            src_port: udp.src_port,
            dst_port: udp.dst_port,
            protocol: datagram.protocol,
            payload: udp.payload,
        })
    }

    /// Dispatch a bare IP buffer on its version nibble.
    fn parse_raw_ip(data: &[u8]) -> Option<IpDatagram<'_>> {
        let version = (data.first()? >> 4) & 0x0F;
        match version {
            4 => ip::parse_ipv4(data),
            6 => ip::parse_ipv6(data),
            _ => None,
        }
    }
}
