//! Target-protocol detection heuristic.
//!
//! The wrapped protocol normally runs on a small set of well-known UDP ports,
//! but it can appear on arbitrary ports when tunneled through game routers.
//! Detection therefore accepts *either* a known port *or* a recognized
//! leading magic byte. Magic-byte collisions on foreign traffic exist but are
//! rare enough to tolerate; downstream decoding drops anything the codec
//! cannot make sense of.

/// Default UDP ports the target protocol is served on.
pub const DEFAULT_UDP_PORTS: [u16; 3] = [5055, 5056, 5058];

/// Leading payload bytes that mark a protocol datagram.
pub const MAGIC_BYTES: [u8; 3] = [0xF1, 0xF2, 0xFE];

/// Minimum payload length for a signature match to be meaningful.
pub const MIN_SIGNATURE_LEN: usize = 3;

/// Returns true when the payload carries a protocol signature: a recognized
/// first byte and at least [`MIN_SIGNATURE_LEN`] bytes behind it.
pub fn matches_signature(payload: &[u8]) -> bool {
    if payload.len() < MIN_SIGNATURE_LEN {
        return false;
    }
    MAGIC_BYTES.contains(&payload[0])
}

/// Port-or-signature heuristic over one UDP datagram.
///
/// A non-empty payload matches when either endpoint port is in `ports` or
/// the payload starts with a magic byte.
pub fn is_protocol_datagram(ports: &[u16], src_port: u16, dst_port: u16, payload: &[u8]) -> bool {
    let port_match = ports.contains(&src_port) || ports.contains(&dst_port);
    (port_match || matches_signature(payload)) && !payload.is_empty()
}
