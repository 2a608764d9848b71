//! Length-prefixed framing: `[u32 little-endian length N][N payload bytes]`

use crate::{LENGTH_PREFIX_LEN, MAX_FRAME_LEN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("connection closed by peer")]
    Closed,
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("frame length mismatch: declared {declared} bytes, carried {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    Oversized(usize),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the declared payload length from a 4-byte prefix.
pub fn read_length_prefix(prefix: [u8; LENGTH_PREFIX_LEN]) -> Result<usize, FrameError> {
    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(len));
    }
    Ok(len)
}

/// Prepends the length prefix to `payload`, producing one contiguous buffer
/// so the whole frame can be written in a single call.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(payload.len()));
    }
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Splits one complete frame into its payload.
///
/// The declared length must match the carried bytes exactly.
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], FrameError> {
    if frame.len() < LENGTH_PREFIX_LEN {
        return Err(FrameError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: frame.len(),
        });
    }

    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    prefix.copy_from_slice(&frame[..LENGTH_PREFIX_LEN]);
    let declared = read_length_prefix(prefix)?;
    let payload = &frame[LENGTH_PREFIX_LEN..];

    if payload.len() < declared {
        return Err(FrameError::Truncated {
            expected: declared,
            actual: payload.len(),
        });
    }
    if payload.len() > declared {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_little_endian() {
        let frame = encode_frame(&[0xAA; 258]).unwrap();
        assert_eq!(&frame[..4], &[2, 1, 0, 0]);
        assert_eq!(frame.len(), 262);
    }

    #[test]
    fn test_decode_exact_frame() {
        let frame = encode_frame(b"hello").unwrap();
        assert_eq!(decode_frame(&frame).unwrap(), b"hello");
    }

    #[test]
    fn test_empty_payload_is_valid() {
        let frame = encode_frame(&[]).unwrap();
        assert_eq!(frame, vec![0, 0, 0, 0]);
        assert!(decode_frame(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = decode_frame(&[1, 0]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut frame = encode_frame(b"payload").unwrap();
        frame.truncate(frame.len() - 3);
        assert!(matches!(
            decode_frame(&frame),
            Err(FrameError::Truncated {
                expected: 7,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_extra_bytes_are_a_mismatch() {
        let mut frame = encode_frame(b"abc").unwrap();
        frame.push(0);
        assert!(matches!(
            decode_frame(&frame),
            Err(FrameError::LengthMismatch {
                declared: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_oversized_prefix_rejected() {
        let prefix = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        assert!(matches!(
            read_length_prefix(prefix),
            Err(FrameError::Oversized(_))
        ));
    }
}
