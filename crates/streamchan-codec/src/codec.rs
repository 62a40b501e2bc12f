use std::fmt;
use std::str::FromStr;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::binary::Binary;
use crate::error::{CodecError, Result};
use crate::text::Text;

/// Encode/decode strategy for typed messages over a byte buffer.
///
/// Decoding distinguishes three outcomes:
/// - `Ok(Some(value))`: one well-formed message was consumed from `src`
/// - `Ok(None)`: `src` holds no complete message yet
/// - `Err(_)`: malformed data; at least one byte of `src` was consumed, so a
///   caller that retries always makes progress
pub trait WireCodec {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Append one encoded message to `dst`.
    fn encode<T: Serialize + ?Sized>(&self, value: &T, dst: &mut BytesMut) -> Result<()>;

    /// Decode the next message from the front of `src`.
    fn decode<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>>;

    /// Decode whatever is left once the stream has ended.
    ///
    /// Returns `Ok(None)` when nothing is buffered, i.e. the stream ended
    /// cleanly between messages. Leftover bytes that do not form a message
    /// are dropped and reported as [`CodecError::Truncated`].
    fn decode_eof<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(value) => Ok(Some(value)),
            None => {
                let buffered = src.len();
                src.clear();
                Err(CodecError::Truncated { buffered })
            }
        }
    }
}

/// Run-time selection between the two wire formats, with default limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Binary,
    Text,
}

impl WireCodec for WireFormat {
    fn name(&self) -> &'static str {
        match self {
            WireFormat::Binary => Binary::default().name(),
            WireFormat::Text => Text::default().name(),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        match self {
            WireFormat::Binary => Binary::default().encode(value, dst),
            WireFormat::Text => Text::default().encode(value, dst),
        }
    }

    fn decode<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        match self {
            WireFormat::Binary => Binary::default().decode(src),
            WireFormat::Text => Text::default().decode(src),
        }
    }

    fn decode_eof<T: DeserializeOwned>(&self, src: &mut BytesMut) -> Result<Option<T>> {
        match self {
            WireFormat::Binary => Binary::default().decode_eof(src),
            WireFormat::Text => Text::default().decode_eof(src),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bin" | "cbor" => Ok(WireFormat::Binary),
            "text" | "json" => Ok(WireFormat::Text),
            other => Err(format!("unknown wire format '{other}' (expected binary or text)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Announce {
        root: String,
        count: u64,
        leaf: Vec<u8>,
        parent: Option<String>,
    }

    fn sample() -> Announce {
        Announce {
            root: "bafyroot".to_string(),
            count: 3,
            leaf: vec![0, 1, 2, 0xff],
            parent: None,
        }
    }

    #[test]
    fn both_formats_roundtrip_the_same_value() {
        for format in [WireFormat::Binary, WireFormat::Text] {
            let mut buf = BytesMut::new();
            format.encode(&sample(), &mut buf).unwrap();
            let decoded: Announce = format.decode(&mut buf).unwrap().unwrap();
            assert_eq!(decoded, sample(), "format {format}");
            assert!(buf.is_empty(), "format {format}");
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Control {
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    }

    #[test]
    fn both_formats_accept_optional_dynamic_payloads() {
        let present = Control {
            kind: "hello".to_string(),
            payload: Some(serde_json::json!({"a": 1, "tags": ["x", "y"]})),
        };
        let absent = Control {
            kind: "bye".to_string(),
            payload: None,
        };

        for format in [WireFormat::Binary, WireFormat::Text] {
            for value in [&present, &absent] {
                let mut buf = BytesMut::new();
                format.encode(value, &mut buf).unwrap();
                let decoded: Control = format.decode(&mut buf).unwrap().unwrap();
                assert_eq!(&decoded, value, "format {format}");
                assert!(buf.is_empty(), "format {format}");
            }
        }
    }

    #[test]
    fn formats_are_not_wire_compatible() {
        let mut buf = BytesMut::new();
        WireFormat::Text.encode(&sample(), &mut buf).unwrap();
        let result: Result<Option<Announce>> = WireFormat::Binary.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::InvalidMagic { .. })));
    }

    #[test]
    fn default_decode_eof_reports_clean_end() {
        let mut buf = BytesMut::new();
        let result: Option<Announce> = WireFormat::Binary.decode_eof(&mut buf).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("binary".parse::<WireFormat>().unwrap(), WireFormat::Binary);
        assert_eq!("JSON".parse::<WireFormat>().unwrap(), WireFormat::Text);
        assert_eq!(" text ".parse::<WireFormat>().unwrap(), WireFormat::Text);
        assert!("msgpack".parse::<WireFormat>().is_err());
        assert_eq!(WireFormat::default(), WireFormat::Binary);
    }
}
