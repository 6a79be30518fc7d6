//! Ethernet (layer 2) frame parsing.

/// Fixed Ethernet II header length: two MAC addresses plus the ethertype.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Ethertype for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Ethertype for IPv6.
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// A parsed Ethernet II frame borrowing the capture buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    pub dst_mac: [u8; 6],
    pub src_mac: [u8; 6],
    pub ethertype: u16,
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Parse a frame from raw link-layer bytes.
    ///
    /// Returns `None` when the buffer is shorter than the 14-byte header.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return None;
        }

        let dst_mac: [u8; 6] = data[0..6].try_into().ok()?;
        let src_mac: [u8; 6] = data[6..12].try_into().ok()?;
        let ethertype = u16::from_be_bytes([data[12], data[13]]);

        Some(Self { dst_mac, src_mac, ethertype, payload: &data[ETHERNET_HEADER_LEN..] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xAA; 6];
        bytes.extend_from_slice(&[0xBB; 6]);
        bytes.extend_from_slice(&ethertype.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn parses_ipv4_frame() {
        let bytes = frame_bytes(ETHERTYPE_IPV4, &[1, 2, 3]);
        let frame = EthernetFrame::parse(&bytes).unwrap();

        assert_eq!(frame.dst_mac, [0xAA; 6]);
        assert_eq!(frame.src_mac, [0xBB; 6]);
        assert_eq!(frame.ethertype, ETHERTYPE_IPV4);
        assert_eq!(frame.payload, &[1, 2, 3]);
    }

    #[test]
    fn empty_payload_is_valid() {
        let bytes = frame_bytes(ETHERTYPE_IPV6, &[]);
        let frame = EthernetFrame::parse(&bytes).unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn truncated_header_returns_none() {
        assert!(EthernetFrame::parse(&[0u8; 13]).is_none());
        assert!(EthernetFrame::parse(&[]).is_none());
    }
}
