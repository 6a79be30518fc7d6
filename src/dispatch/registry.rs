//! Typed-codec registry.
//!
//! Maps `(kind, code)` to the function that decodes that frame into typed
//! fields. The table is assembled explicitly at startup and read-only
//! afterwards; duplicate keys with different implementations are a
//! programming error surfaced immediately, not a runtime condition.

use std::collections::HashMap;

use crate::decode::{Frame, FrameKind};
use crate::events::EventPayload;
use crate::{Result, SnifferError};

/// A pure frame-to-typed-fields decode function.
///
/// Plain `fn` rather than a closure so registrations have a comparable
/// identity: re-registering the same function is a no-op, registering a
/// different one under the same key is fatal.
pub type DecodeFn = fn(&Frame) -> EventPayload;

/// Read-only lookup table from `(kind, code)` to decode function.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<(FrameKind, u16), DecodeFn>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decode` for frames of `kind` with opcode `code`.
    ///
    /// Idempotent for the identical function; fails fast on a conflicting
    /// registration so misconfiguration aborts startup instead of silently
    /// shadowing a codec.
    pub fn register(&mut self, kind: FrameKind, code: u16, decode: DecodeFn) -> Result<()> {
        match self.parsers.get(&(kind, code)) {
            Some(existing) if std::ptr::fn_addr_eq(*existing, decode) => Ok(()),
            Some(_) => Err(SnifferError::DuplicateParser { kind, code }),
            None => {
                self.parsers.insert((kind, code), decode);
                Ok(())
            }
        }
    }

    pub fn get(&self, kind: FrameKind, code: u16) -> Option<DecodeFn> {
        self.parsers.get(&(kind, code)).copied()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_a(_frame: &Frame) -> EventPayload {
        EventPayload::Raw
    }

    fn decode_b(frame: &Frame) -> EventPayload {
        let _ = frame.code;
        EventPayload::Raw
    }

    #[test]
    fn registers_and_looks_up() {
        let mut registry = ParserRegistry::new();
        registry.register(FrameKind::Event, 3, decode_a).unwrap();

        assert!(registry.get(FrameKind::Event, 3).is_some());
        assert!(registry.get(FrameKind::Event, 4).is_none());
        assert!(registry.get(FrameKind::Request, 3).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_function_twice_is_a_no_op() {
        let mut registry = ParserRegistry::new();
        registry.register(FrameKind::Event, 3, decode_a).unwrap();
        registry.register(FrameKind::Event, 3, decode_a).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_function_is_fatal() {
        let mut registry = ParserRegistry::new();
        registry.register(FrameKind::Event, 3, decode_a).unwrap();

        let err = registry.register(FrameKind::Event, 3, decode_b).unwrap_err();
        assert!(matches!(
            err,
            SnifferError::DuplicateParser { kind: FrameKind::Event, code: 3 }
        ));

        // The original registration survives.
        let frame = Frame::new(FrameKind::Event, 3, Default::default());
        assert_eq!((registry.get(FrameKind::Event, 3).unwrap())(&frame), EventPayload::Raw);
    }

    #[test]
    fn same_code_different_kind_coexist() {
        let mut registry = ParserRegistry::new();
        registry.register(FrameKind::Event, 2, decode_a).unwrap();
        registry.register(FrameKind::Response, 2, decode_b).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
