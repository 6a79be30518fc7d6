//! Movement telemetry codec.
//!
//! Movement events carry the moving entity's id at parameter 0 and a
//! fixed-layout binary blob at parameter 1, little-endian:
//!
//! | offset | width | field                          |
//! |--------|-------|--------------------------------|
//! | 0      | 1     | flag (unused)                  |
//! | 1      | 8     | tick timestamp (u64)           |
//! | 9      | 4     | position x (f32)               |
//! | 13     | 4     | position y (f32)               |
//! | 17     | 1     | heading (u8, 0-255 = full turn)|
//! | 18     | 4     | speed (f32)                    |
//! | 22     | 4     | destination x (f32)            |
//! | 26     | 4     | destination y (f32)            |

use serde::Serialize;

use super::EventPayload;
use crate::decode::{Frame, Value};

/// Total blob length; shorter blobs decode to defaults.
pub const MOVE_BLOB_LEN: usize = 30;

/// 2-D world position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Decoded movement telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Movement {
    pub entity_id: i64,
    pub tick: u64,
    pub position: Vec2,
    /// Facing as an unsigned byte spanning a full turn.
    pub heading: u8,
    pub speed: f32,
    pub destination: Vec2,
}

impl Movement {
    /// Heading in radians.
    pub fn heading_radians(&self) -> f32 {
        f32::from(self.heading) / 256.0 * std::f32::consts::TAU
    }
}

/// Decode a movement frame; malformed blobs yield zeroed fields.
pub fn decode(frame: &Frame) -> EventPayload {
    let entity_id = frame.params.get(&0).and_then(Value::as_int).unwrap_or(0);

    let mut movement = Movement { entity_id, ..Movement::default() };
    if let Some(blob) = frame.params.get(&1).and_then(Value::as_bytes) {
        unpack_blob(blob, &mut movement);
    }

    EventPayload::Movement(movement)
}

fn unpack_blob(blob: &[u8], movement: &mut Movement) {
    if blob.len() < MOVE_BLOB_LEN {
        return;
    }

    // blob[0] is a flag byte with no known consumer.
    movement.tick = u64::from_le_bytes(blob[1..9].try_into().expect("fixed slice"));
    movement.position = Vec2::new(f32_at(blob, 9), f32_at(blob, 13));
    movement.heading = blob[17];
    movement.speed = f32_at(blob, 18);
    movement.destination = Vec2::new(f32_at(blob, 22), f32_at(blob, 26));
}

fn f32_at(blob: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(blob[offset..offset + 4].try_into().expect("fixed slice"))
}
