//! Decoded protocol frames.

use serde::Serialize;

use super::Parameters;

/// Direction of a protocol frame.
///
/// `Debug` never appears on decoded frames; it exists so subscriptions can
/// ask for the catch-all channel through the same kind enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameKind {
    Event,
    Request,
    Response,
    Debug,
}

/// One decoded protocol message: direction, opcode and ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    pub code: u16,
    pub params: Parameters,
}

impl Frame {
    pub fn new(kind: FrameKind, code: u16, params: Parameters) -> Self {
        Self { kind, code, params }
    }
}
