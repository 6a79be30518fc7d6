//! Session and world-transition codecs: join, cluster change, local
//! movement intent.

use serde::Serialize;

use super::{EventPayload, Vec2};
use crate::decode::{Frame, Value};

/// Response to the initial world join; anchors the local player.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JoinFinish {
    pub timestamp: i64,
    pub character_name: String,
    pub position: Vec2,
    /// World cluster identifier, when the server included one.
    pub cluster_index: String,
}

/// Response confirming a transition into another world cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClusterChange {
    pub cluster_index: String,
}

/// The local client's own movement intent (outgoing request).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MoveRequest {
    pub timestamp: i64,
    pub position: Vec2,
    pub direction: f32,
    pub speed: f32,
}

/// Cluster ids arrive as either strings or bare integers.
fn cluster_index(value: Option<&Value>) -> String {
    match value {
        Some(Value::Str(s)) => s.clone(),
        Some(Value::Int(i)) => i.to_string(),
        _ => String::new(),
    }
}

pub fn decode_join_finish(frame: &Frame) -> EventPayload {
    let params = &frame.params;
    let (x, y) = params.get(&9).and_then(Value::as_pair).unwrap_or_default();

    EventPayload::JoinFinish(JoinFinish {
        timestamp: params.get(&0).and_then(Value::as_int).unwrap_or(0),
        character_name: params.get(&2).and_then(Value::as_str).unwrap_or_default().to_string(),
        position: Vec2::new(x, y),
        cluster_index: cluster_index(params.get(&65)),
    })
}

pub fn decode_cluster_change(frame: &Frame) -> EventPayload {
    EventPayload::ClusterChange(ClusterChange {
        cluster_index: cluster_index(frame.params.get(&0)),
    })
}

pub fn decode_move_request(frame: &Frame) -> EventPayload {
    let params = &frame.params;
    let (x, y) = params.get(&1).and_then(Value::as_pair).unwrap_or_default();

    EventPayload::MoveRequest(MoveRequest {
        timestamp: params.get(&0).and_then(Value::as_int).unwrap_or(0),
        position: Vec2::new(x, y),
        direction: params.get(&2).and_then(Value::as_f32).unwrap_or(0.0),
        speed: params.get(&4).and_then(Value::as_f32).unwrap_or(0.0),
    })
}
