//! UDP (layer 4) header parsing.

/// Fixed UDP header length.
pub const UDP_HEADER_LEN: usize = 8;

/// A parsed UDP datagram borrowing the capture buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub checksum: u16,
    pub payload: &'a [u8],
}

impl<'a> UdpDatagram<'a> {
    /// Parse the 8-byte big-endian UDP header; the remainder is the payload.
    ///
    /// The length field is carried through as-is and not validated against
    /// the buffer: captures can be truncated by the snap length, and the
    /// protocol heuristic only needs the leading payload bytes.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        if data.len() < UDP_HEADER_LEN {
            return None;
        }

        Some(Self {
            src_port: u16::from_be_bytes([data[0], data[1]]),
            dst_port: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
            payload: &data[UDP_HEADER_LEN..],
        })
    }
}
