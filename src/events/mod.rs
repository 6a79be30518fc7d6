//! Typed domain events and their codecs.
//!
//! Every dispatched frame becomes a [`DomainEvent`]. When a codec is
//! registered for the frame's `(kind, code)` the event additionally carries
//! typed fields in [`EventPayload`]; either way the original parameter map
//! travels along in `raw`, so untyped consumers (debug taps, logging) keep
//! working for codes nobody has modelled yet.
//!
//! Codecs are pure functions and degrade gracefully: missing or mistyped
//! parameters produce zeroed fields, never errors, because a partially
//! decoded position update is still more useful to the overlay than none.

pub mod character;
pub mod cluster;
pub mod movement;

pub use character::{CastStart, Leave, NewCharacter};
pub use cluster::{ClusterChange, JoinFinish, MoveRequest};
pub use movement::{Movement, Vec2};

use serde::Serialize;

use crate::Result;
use crate::decode::{Frame, FrameKind, Parameters};
use crate::dispatch::ParserRegistry;

/// Protocol opcodes with a typed codec in this crate.
pub mod codes {
    pub const LEAVE: u16 = 1;
    pub const JOIN_FINISH: u16 = 2;
    pub const MOVE: u16 = 3;
    pub const CAST_START: u16 = 14;
    pub const MOVE_REQUEST: u16 = 21;
    pub const NEW_CHARACTER: u16 = 29;
    pub const CHANGE_CLUSTER: u16 = 35;
}

/// Kind-specific typed fields of a [`DomainEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EventPayload {
    /// No codec registered for this code; only `raw` is populated.
    Raw,
    Movement(Movement),
    MoveRequest(MoveRequest),
    NewCharacter(NewCharacter),
    CastStart(CastStart),
    Leave(Leave),
    JoinFinish(JoinFinish),
    ClusterChange(ClusterChange),
}

/// One fully decoded protocol message as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    pub code: u16,
    pub kind: FrameKind,
    /// Original parameter map, always present even after typed decoding.
    pub raw: Parameters,
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Wrap a frame without typed decoding.
    pub fn raw(frame: Frame) -> Self {
        Self { code: frame.code, kind: frame.kind, raw: frame.params, payload: EventPayload::Raw }
    }
}

/// Build the registry of all codecs shipped with this crate.
///
/// Fails (rather than silently overwriting) on conflicting registrations;
/// see [`ParserRegistry::register`].
pub fn builtin_registry() -> Result<ParserRegistry> {
    let mut registry = ParserRegistry::new();

    registry.register(FrameKind::Event, codes::MOVE, movement::decode)?;
    registry.register(FrameKind::Event, codes::NEW_CHARACTER, character::decode_new_character)?;
    registry.register(FrameKind::Event, codes::CAST_START, character::decode_cast_start)?;
    registry.register(FrameKind::Event, codes::LEAVE, character::decode_leave)?;
    registry.register(FrameKind::Request, codes::MOVE_REQUEST, cluster::decode_move_request)?;
    registry.register(FrameKind::Response, codes::JOIN_FINISH, cluster::decode_join_finish)?;
    registry.register(
        FrameKind::Response,
        codes::CHANGE_CLUSTER,
        cluster::decode_cluster_change,
    )?;

    Ok(registry)
}
