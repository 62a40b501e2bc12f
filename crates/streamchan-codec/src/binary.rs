use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::codec::WireCodec;
use crate::error::{CodecError, Result};

/// Frame header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "SC" (0x53 0x43).
pub const MAGIC: [u8; 2] = [0x53, 0x43];

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Compact binary codec: CBOR payloads in a length-prefixed frame.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬─────────────────────┐
/// │ Magic (2B)   │ Length    │ Payload             │
/// │ 0x53 0x43    │ (4B LE)   │ (CBOR, Length B)    │
/// │ "SC"         │           │                     │
/// └──────────────┴───────────┴─────────────────────┘
/// ```
///
/// The magic lets a reader resynchronize after garbage: bytes in front of the
/// next candidate magic are discarded and reported as
/// [`CodecError::InvalidMagic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary {
    max_payload: usize,
}

impl Binary {
    /// Binary codec with the default 16 MiB payload limit.
    pub const fn new() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Binary codec with an explicit payload limit.
    pub const fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }

    /// Maximum accepted payload size in bytes.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Default for Binary {
    fn default() -> Self {
        Self::new()
    }
}

impl WireCodec for Binary {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        let mut payload = Vec::new();
        ciborium::into_writer(value, &mut payload)?;
        let max = self.max_payload.min(u32::MAX as usize);
        if payload.len() > max {
            return Err(CodecError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        dst.reserve(HEADER_SIZE + payload.len());
        dst.put_slice(&MAGIC);
        dst.put_u32_le(payload.len() as u32);
        dst.put_slice(&payload);
        Ok(())
    }

    fn decode<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        if src.is_empty() {
            return Ok(None);
        }

        let seen = src.len().min(MAGIC.len());
        if src[..seen] != MAGIC[..seen] {
            let skipped = resync(src);
            return Err(CodecError::InvalidMagic { skipped });
        }

        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
        if payload_len > self.max_payload {
            // Drop the magic so the next attempt scans for a fresh header.
            src.advance(MAGIC.len());
            return Err(CodecError::PayloadTooLarge {
                size: payload_len,
                max: self.max_payload,
            });
        }

        let total = HEADER_SIZE + payload_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(payload_len);
        let value = ciborium::from_reader(payload.as_ref())?;
        Ok(Some(value))
    }
}

/// Discard bytes up to the next byte that could start a frame.
fn resync(src: &mut BytesMut) -> usize {
    let skip = src[1..]
        .iter()
        .position(|&b| b == MAGIC[0])
        .map_or(src.len(), |pos| pos + 1);
    trace!(skip, buffered = src.len(), "resynchronizing binary stream");
    src.advance(skip);
    skip
}
