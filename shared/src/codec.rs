//! Deterministic encoding of [`WireMessage`] payloads
//!
//! Payloads use bincode with fixed-width little-endian integers. The enum
//! variant index is written first as a `u32`, which is the message tag.

use crate::frame::{decode_frame, encode_frame, FrameError};
use crate::messages::WireMessage;
use crate::{MAX_FRAME_LEN, WIRE_TAG_COUNT};
use bincode::Options;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("payload truncated")]
    Truncated,
    #[error("unknown message tag {0}")]
    UnknownTag(u32),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("missing required entity id")]
    MissingEntityId,
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] bincode::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_FRAME_LEN as u64)
        .with_little_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Serializes a message payload (without length prefix).
pub fn encode(message: &WireMessage) -> Result<Vec<u8>, EncodeError> {
    Ok(wire_options().serialize(message)?)
}

/// Parses and validates a message payload (without length prefix).
pub fn decode(payload: &[u8]) -> Result<WireMessage, DecodeError> {
    if payload.len() < 4 {
        return Err(DecodeError::Truncated);
    }
    let tag = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    if tag >= WIRE_TAG_COUNT {
        return Err(DecodeError::UnknownTag(tag));
    }

    let message: WireMessage = wire_options()
        .deserialize(payload)
        .map_err(|e| match *e {
            bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                DecodeError::Truncated
            }
            other => DecodeError::Malformed(other.to_string()),
        })?;

    message.validate()?;
    Ok(message)
}

/// Encodes a message and wraps it in a length-prefixed frame.
pub fn encode_frame_message(message: &WireMessage) -> Result<Vec<u8>, EncodeError> {
    let payload = encode(message)?;
    Ok(encode_frame(&payload)?)
}

#[derive(Debug, Error)]
pub enum FrameDecodeError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Decodes one complete length-prefixed frame.
pub fn decode_frame_message(frame: &[u8]) -> Result<WireMessage, FrameDecodeError> {
    let payload = decode_frame(frame)?;
    Ok(decode(payload)?)
}
