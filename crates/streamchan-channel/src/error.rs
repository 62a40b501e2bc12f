use std::time::Duration;

use streamchan_codec::CodecError;

/// Errors returned by channel operations.
///
/// Timeout, end-of-stream and malformed data are separate variants so a
/// caller can always tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// No well-formed message arrived before the deadline.
    #[error("no message received within {0:?}")]
    Timeout(Duration),

    /// The peer closed the stream cleanly before sending a message.
    #[error("stream ended before a message arrived")]
    EndOfStream,

    /// The receive was cancelled through its cancellation token.
    #[error("receive cancelled")]
    Cancelled,

    /// Encoding failed, or the peer sent malformed or partial data.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The stream failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// True for [`ChannelError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::Timeout(_))
    }

    /// True for [`ChannelError::EndOfStream`].
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ChannelError::EndOfStream)
    }

    /// True for codec failures: malformed input, or a value that could not be encoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ChannelError::Codec(_))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
