use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::WireCodec;
use crate::error::{CodecError, Result};

/// Default maximum line length: 16 MiB.
pub const DEFAULT_MAX_LINE: usize = 16 * 1024 * 1024;

/// Human-readable codec: one JSON value per `\n`-terminated line.
///
/// Blank lines are ignored. A last line without a terminator is still
/// decoded once the stream has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Text {
    max_line: usize,
}

impl Text {
    /// Text codec with the default 16 MiB line limit.
    pub const fn new() -> Self {
        Self {
            max_line: DEFAULT_MAX_LINE,
        }
    }

    /// Text codec with an explicit line limit (terminator excluded).
    pub const fn with_max_line(max_line: usize) -> Self {
        Self { max_line }
    }

    /// Maximum accepted line length in bytes.
    pub fn max_line(&self) -> usize {
        self.max_line
    }
}

impl Default for Text {
    fn default() -> Self {
        Self::new()
    }
}

impl WireCodec for Text {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        let line = serde_json::to_vec(value)?;
        if line.len() > self.max_line {
            return Err(CodecError::LineTooLong {
                size: line.len(),
                max: self.max_line,
            });
        }

        dst.reserve(line.len() + 1);
        dst.put_slice(&line);
        dst.put_u8(b'\n');
        Ok(())
    }

    fn decode<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        loop {
            let Some(end) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_line {
                    let size = src.len();
                    src.clear();
                    return Err(CodecError::LineTooLong {
                        size,
                        max: self.max_line,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(end + 1);
            let body = line[..end].trim_ascii();
            if body.is_empty() {
                continue;
            }
            if body.len() > self.max_line {
                return Err(CodecError::LineTooLong {
                    size: body.len(),
                    max: self.max_line,
                });
            }

            return serde_json::from_slice(body).map(Some).map_err(Into::into);
        }
    }

    fn decode_eof<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        if let Some(value) = self.decode(src)? {
            return Ok(Some(value));
        }

        let rest = src.split();
        let body = rest.trim_ascii();
        if body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(body).map(Some).map_err(Into::into)
    }
}
