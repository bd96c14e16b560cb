//! Binary codec for wall position messages.
//!
//! The payload is a fixed-size little-endian layout: the message id as a
//! `u32`, the wall index, four vertex coordinates and the height.

use map_procedures_core::WallPositionMessage;
use thiserror::Error;

/// Encoded size of a [`WallPositionMessage`] in bytes.
pub const WALL_POSITION_WIRE_SIZE: usize = 4 + 4 + 4 * 2 + 2;

/// Errors that can occur during encoding or decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The serializer rejected the message or the payload was malformed.
    #[error("wall position codec failed: {0}")]
    Bincode(#[from] bincode::Error),
    /// The payload does not have the fixed message size.
    #[error("expected a {expected}-byte payload, got {actual} bytes")]
    UnexpectedLength {
        /// Size every payload must have.
        expected: usize,
        /// Size of the rejected payload.
        actual: usize,
    },
}

/// Encodes a message into its wire payload.
pub fn encode(message: &WallPositionMessage) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(message)?)
}

/// Decodes a wire payload.
pub fn decode(data: &[u8]) -> Result<WallPositionMessage, CodecError> {
    if data.len() != WALL_POSITION_WIRE_SIZE {
        return Err(CodecError::UnexpectedLength {
            expected: WALL_POSITION_WIRE_SIZE,
            actual: data.len(),
        });
    }
    Ok(bincode::deserialize(data)?)
}
