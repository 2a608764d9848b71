//! Wire protocol shared by the client core and its tests.

pub mod codec;
pub mod frame;
pub mod messages;

pub use codec::{
    decode, decode_frame_message, encode, encode_frame_message, DecodeError, EncodeError,
    FrameDecodeError,
};
pub use frame::{decode_frame, encode_frame, read_length_prefix, FrameError};
pub use messages::*;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9090;

/// Size of the little-endian length prefix in front of every payload.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest payload accepted from the wire. Anything bigger means the stream
/// is out of sync.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Number of [`WireMessage`] variants; tags at or above this are unknown.
pub const WIRE_TAG_COUNT: u32 = 19;
