//! Payload decoding over an opaque wire codec.
//!
//! The session/reliability layer of the wrapped protocol is handled by an
//! external codec behind the [`WireCodec`] trait: given one raw payload it
//! synchronously emits zero or more [`CodecMessage`]s (a single datagram can
//! carry several commands). [`ProtocolDecoder`] turns those messages into
//! [`Frame`]s by resolving the opcode out of the parameter map.
//!
//! Opcode resolution is asymmetric on purpose, mirroring the upstream
//! protocol behavior: events without an opcode parameter fall back to the
//! protocol-level event code, while requests and responses without one are
//! dropped.

mod frame;
mod value;

pub use frame::{Frame, FrameKind};
pub use value::{Parameters, Value};

use tracing::{debug, trace};

use crate::Result;

/// Parameter key carrying the opcode on event frames.
pub const EVENT_CODE_KEY: u8 = 252;

/// Parameter key carrying the opcode on request and response frames.
pub const OPERATION_CODE_KEY: u8 = 253;

/// One message surfaced by the wire codec during payload parsing.
///
/// `code`/`operation` are the protocol-level identifiers from the command
/// header, distinct from the opcode embedded in the parameter map.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecMessage {
    Event { code: u8, params: Parameters },
    Request { operation: u8, params: Parameters },
    Response { operation: u8, params: Parameters },
}

/// The opaque session-layer codec boundary.
///
/// Implementations own reassembly, reliability and deserialization of the
/// wrapped protocol; this crate only consumes the resulting messages.
pub trait WireCodec: Send {
    /// Parse one raw payload, invoking `emit` for every message found.
    fn parse(&mut self, payload: &[u8], emit: &mut dyn FnMut(CodecMessage)) -> Result<()>;
}

/// Turns codec messages into dispatchable frames.
pub struct ProtocolDecoder<C> {
    codec: C,
}

impl<C: WireCodec> ProtocolDecoder<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Decode one payload, handing each resolvable frame to `out`.
    ///
    /// Codec errors propagate; messages without a resolvable opcode are
    /// dropped here (requests/responses) or remapped (events) per the
    /// protocol's conventions.
    pub fn decode(&mut self, payload: &[u8], out: &mut dyn FnMut(Frame)) -> Result<()> {
        self.codec.parse(payload, &mut |message| {
            if let Some(frame) = resolve_frame(message) {
                out(frame);
            }
        })
    }
}

/// Extract the opcode stored under `key`, if present and in range.
///
/// Negative or oversized integers would otherwise alias onto valid codes
/// when truncated, so they count as absent.
fn param_opcode(params: &Parameters, key: u8) -> Option<u16> {
    params.get(&key).and_then(Value::as_int).and_then(|v| u16::try_from(v).ok())
}

/// Resolve the dispatch opcode for one codec message.
fn resolve_frame(message: CodecMessage) -> Option<Frame> {
    match message {
        CodecMessage::Event { code, params } => {
            // Events without a usable opcode parameter remap to their
            // protocol-level event code.
            let opcode = param_opcode(&params, EVENT_CODE_KEY).unwrap_or(u16::from(code));
            Some(Frame::new(FrameKind::Event, opcode, params))
        }
        CodecMessage::Request { operation, params } => {
            match param_opcode(&params, OPERATION_CODE_KEY) {
                Some(opcode) => Some(Frame::new(FrameKind::Request, opcode, params)),
                None => {
                    debug!(operation, "dropping request without opcode parameter");
                    None
                }
            }
        }
        CodecMessage::Response { operation, params } => {
            match param_opcode(&params, OPERATION_CODE_KEY) {
                Some(opcode) => Some(Frame::new(FrameKind::Response, opcode, params)),
                None => {
                    trace!(operation, "dropping response without opcode parameter");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Codec stub replaying canned messages, one per input byte >= its
    /// index, used to exercise the decoder without a session layer.
    pub(crate) struct ReplayCodec {
        pub messages: Vec<CodecMessage>,
    }

    impl WireCodec for ReplayCodec {
        fn parse(&mut self, _payload: &[u8], emit: &mut dyn FnMut(CodecMessage)) -> Result<()> {
            for message in self.messages.drain(..) {
                emit(message);
            }
            Ok(())
        }
    }

    fn params_with(key: u8, value: Value) -> Parameters {
        let mut params = Parameters::new();
        params.insert(key, value);
        params
    }

    fn collect_frames(messages: Vec<CodecMessage>) -> Vec<Frame> {
        let mut decoder = ProtocolDecoder::new(ReplayCodec { messages });
        let mut frames = Vec::new();
        decoder.decode(&[0u8], &mut |frame| frames.push(frame)).unwrap();
        frames
    }

    #[test]
    fn event_opcode_comes_from_parameter() {
        let frames = collect_frames(vec![CodecMessage::Event {
            code: 1,
            params: params_with(EVENT_CODE_KEY, Value::Int(29)),
        }]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Event);
        assert_eq!(frames[0].code, 29);
    }

    #[test]
    fn event_without_parameter_falls_back_to_protocol_code() {
        let frames =
            collect_frames(vec![CodecMessage::Event { code: 3, params: Parameters::new() }]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 3);
    }

    #[test]
    fn request_and_response_resolve_operation_key() {
        let frames = collect_frames(vec![
            CodecMessage::Request {
                operation: 1,
                params: params_with(OPERATION_CODE_KEY, Value::Int(21)),
            },
            CodecMessage::Response {
                operation: 1,
                params: params_with(OPERATION_CODE_KEY, Value::Int(35)),
            },
        ]);

        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].kind, frames[0].code), (FrameKind::Request, 21));
        assert_eq!((frames[1].kind, frames[1].code), (FrameKind::Response, 35));
    }

    #[test]
    fn requests_and_responses_without_opcode_are_dropped() {
        let frames = collect_frames(vec![
            CodecMessage::Request { operation: 9, params: Parameters::new() },
            CodecMessage::Response { operation: 9, params: Parameters::new() },
            // The event in the same payload still survives.
            CodecMessage::Event { code: 14, params: Parameters::new() },
        ]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Event);
        assert_eq!(frames[0].code, 14);
    }

    #[test]
    fn out_of_range_opcodes_count_as_absent() {
        let frames = collect_frames(vec![
            // Negative and oversized opcodes must not wrap onto valid codes.
            CodecMessage::Event { code: 3, params: params_with(EVENT_CODE_KEY, Value::Int(-1)) },
            CodecMessage::Event {
                code: 14,
                params: params_with(EVENT_CODE_KEY, Value::Int(65539)),
            },
            CodecMessage::Request {
                operation: 1,
                params: params_with(OPERATION_CODE_KEY, Value::Int(-21)),
            },
            CodecMessage::Response {
                operation: 1,
                params: params_with(OPERATION_CODE_KEY, Value::Int(i64::from(u16::MAX) + 35)),
            },
        ]);

        // Events fall back to their protocol-level code; requests and
        // responses are dropped like any other missing opcode.
        let resolved: Vec<(FrameKind, u16)> = frames.iter().map(|f| (f.kind, f.code)).collect();
        assert_eq!(resolved, vec![(FrameKind::Event, 3), (FrameKind::Event, 14)]);
    }

    #[test]
    fn one_payload_may_yield_many_frames() {
        let frames = collect_frames(vec![
            CodecMessage::Event { code: 3, params: params_with(EVENT_CODE_KEY, Value::Int(3)) },
            CodecMessage::Event { code: 3, params: params_with(EVENT_CODE_KEY, Value::Int(29)) },
            CodecMessage::Event { code: 3, params: params_with(EVENT_CODE_KEY, Value::Int(14)) },
        ]);

        let codes: Vec<u16> = frames.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec![3, 29, 14]);
    }
}
