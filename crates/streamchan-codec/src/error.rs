/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The buffer did not start with a frame header; `skipped` bytes were discarded.
    #[error("invalid frame magic (expected \"SC\"), skipped {skipped} bytes")]
    InvalidMagic { skipped: usize },

    /// The frame announces a payload above the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A text line exceeds the configured maximum.
    #[error("line too long ({size} bytes, max {max})")]
    LineTooLong { size: usize, max: usize },

    /// The value could not be encoded as CBOR.
    #[error("binary encode error: {0}")]
    BinaryEncode(#[from] ciborium::ser::Error<std::io::Error>),

    /// The binary payload is not valid CBOR for the expected type.
    #[error("binary payload error: {0}")]
    Binary(#[from] ciborium::de::Error<std::io::Error>),

    /// The text payload could not be (de)serialized.
    #[error("json payload error: {0}")]
    Text(#[from] serde_json::Error),

    /// The stream ended part-way through a message.
    #[error("stream ended inside a message ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
