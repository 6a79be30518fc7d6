//! Character lifecycle codecs: spawn, spell cast, despawn.

use serde::Serialize;

use super::EventPayload;
use crate::decode::{Frame, Value};

/// A character entering visibility range.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NewCharacter {
    pub entity_id: i64,
    pub name: String,
    pub guild: String,
    pub user_guid: i64,
}

/// A spell cast starting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CastStart {
    pub entity_id: i64,
    pub spell_id: i64,
}

/// An entity leaving visibility range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Leave {
    pub entity_id: i64,
}

pub fn decode_new_character(frame: &Frame) -> EventPayload {
    let params = &frame.params;
    EventPayload::NewCharacter(NewCharacter {
        entity_id: params.get(&0).and_then(Value::as_int).unwrap_or(0),
        name: params.get(&1).and_then(Value::as_str).unwrap_or_default().to_string(),
        guild: params.get(&8).and_then(Value::as_str).unwrap_or_default().to_string(),
        user_guid: params.get(&7).and_then(Value::as_int).unwrap_or(0),
    })
}

pub fn decode_cast_start(frame: &Frame) -> EventPayload {
    let params = &frame.params;
    EventPayload::CastStart(CastStart {
        entity_id: params.get(&0).and_then(Value::as_int).unwrap_or(0),
        spell_id: params.get(&5).and_then(Value::as_int).unwrap_or(0),
    })
}

pub fn decode_leave(frame: &Frame) -> EventPayload {
    EventPayload::Leave(Leave {
        entity_id: frame.params.get(&0).and_then(Value::as_int).unwrap_or(0),
    })
}
