//! Wire codecs for typed stream messages.
//!
//! Two interchangeable encodings are provided for any serde type:
//! - [`Binary`]: self-describing CBOR payloads in a magic + length frame
//! - [`Text`]: newline-delimited JSON, one value per line
//!
//! Codecs are stateless. They encode into, and decode out of, a caller-owned
//! [`bytes::BytesMut`] buffer, so the caller decides when bytes are read from
//! the stream and how long it is willing to wait for them.

pub mod binary;
pub mod codec;
pub mod error;
pub mod text;

pub use binary::{Binary, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC};
pub use codec::{WireCodec, WireFormat};
pub use error::{CodecError, Result};
pub use text::{Text, DEFAULT_MAX_LINE};
