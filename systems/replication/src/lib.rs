#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replication of dynamic wall geometry to clients.
//!
//! Every invocation broadcasts the full wall store, one unreliable message per
//! wall in index order. Lost messages are repaired by the next broadcast, so
//! no acknowledgement or delta tracking exists at this layer.

pub mod codec;

use map_procedures_core::{
    DynamicWall, MessageId, MessagesSender, WallIndex, WallPositionMessage, WallView,
    FIXED_POINT_SCALE,
};

pub use codec::{decode, encode, CodecError, WALL_POSITION_WIRE_SIZE};

/// Converts a world-space scalar into wire fixed point, truncating toward zero.
///
/// Values outside the `i16` range saturate.
#[must_use]
pub fn to_fixed_point(value: f32) -> i16 {
    (value * FIXED_POINT_SCALE) as i16
}

/// Builds the wire message describing one wall.
#[must_use]
pub fn encode_wall(index: WallIndex, wall: &DynamicWall) -> WallPositionMessage {
    let [first, second] = wall.vertices;
    WallPositionMessage {
        message_id: MessageId::WallPosition,
        wall_index: index.get(),
        vertices_xy: [
            [to_fixed_point(first.x), to_fixed_point(first.y)],
            [to_fixed_point(second.x), to_fixed_point(second.y)],
        ],
        z: to_fixed_point(wall.z),
    }
}

/// Replication system that broadcasts wall state to a transport.
#[derive(Debug, Default)]
pub struct Replication {
    messages_sent: u64,
}

impl Replication {
    /// Creates a new replication system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of messages handed to senders so far.
    #[must_use]
    pub const fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    /// Sends one message per wall, in index order, to `sender`.
    pub fn handle<S>(&mut self, walls: WallView<'_>, sender: &mut S)
    where
        S: MessagesSender + ?Sized,
    {
        for (index, wall) in walls.iter() {
            sender.send_unreliable(&encode_wall(index, wall));
            self.messages_sent = self.messages_sent.saturating_add(1);
        }
    }
}
