use std::time::Duration;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use streamchan_codec::{CodecError, WireCodec};
use tracing::warn;

use crate::error::{ChannelError, Result};

/// What a receive call does once the peer has closed the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStreamPolicy {
    /// Return [`Outcome::EndOfStream`] immediately.
    Stop,
    /// Treat end-of-stream like silence and keep waiting until the deadline.
    WaitForDeadline,
}

/// How a receive call reacts to malformed data and end-of-stream.
///
/// A receive call is a small state machine:
///
/// ```text
/// Waiting --decode ok--------------------------> Delivered
/// Waiting --end of stream (Stop)---------------> EndOfStream
/// Waiting --end of stream (WaitForDeadline)----> Waiting (idle)
/// Waiting --deadline elapsed-------------------> TimedOut
/// Waiting --token cancelled--------------------> Cancelled
/// Waiting --malformed (retry_malformed)--------> Waiting
/// Waiting --malformed (!retry_malformed)-------> Err(Codec)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivePolicy {
    /// Discard malformed messages and keep waiting inside the same deadline.
    pub retry_malformed: bool,
    /// Reaction to a clean end-of-stream.
    pub end_of_stream: EndOfStreamPolicy,
}

impl ReceivePolicy {
    /// Generic reads: malformed data is returned to the caller at once.
    pub const STRICT: Self = Self {
        retry_malformed: false,
        end_of_stream: EndOfStreamPolicy::Stop,
    };

    /// Acknowledgements: retry malformed data, and do not single out
    /// end-of-stream; the call ends at the deadline.
    pub const ACKNOWLEDGEMENT: Self = Self {
        retry_malformed: true,
        end_of_stream: EndOfStreamPolicy::WaitForDeadline,
    };

    /// Upload announcements: retry malformed data, stop at end-of-stream.
    pub const UPLOAD: Self = Self {
        retry_malformed: true,
        end_of_stream: EndOfStreamPolicy::Stop,
    };

    /// Either swallow a decode failure (logging it) or hand it back.
    pub(crate) fn absorb(&self, err: CodecError) -> Result<()> {
        if self.retry_malformed {
            warn!(error = %err, "discarding malformed message");
            Ok(())
        } else {
            Err(err.into())
        }
    }
}

impl Default for ReceivePolicy {
    fn default() -> Self {
        Self::STRICT
    }
}

/// How a receive call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A well-formed message arrived.
    Delivered(T),
    /// The peer closed the stream before a message arrived.
    EndOfStream,
    /// The deadline passed first.
    TimedOut,
    /// The cancellation token fired first.
    Cancelled,
}

impl<T> Outcome<T> {
    /// True for [`Outcome::Delivered`].
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered(_))
    }

    /// The delivered message, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Delivered(value) => Some(value),
            _ => None,
        }
    }

    /// Map the delivered message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Delivered(value) => Outcome::Delivered(f(value)),
            Outcome::EndOfStream => Outcome::EndOfStream,
            Outcome::TimedOut => Outcome::TimedOut,
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }

    /// Collapse into the error-returning form used by the plain reads.
    pub(crate) fn into_result(self, timeout: Duration) -> Result<T> {
        match self {
            Outcome::Delivered(value) => Ok(value),
            Outcome::EndOfStream => Err(ChannelError::EndOfStream),
            Outcome::TimedOut => Err(ChannelError::Timeout(timeout)),
            Outcome::Cancelled => Err(ChannelError::Cancelled),
        }
    }
}

/// Result of one decode attempt on buffered bytes.
pub(crate) enum Attempt<T> {
    /// A message was decoded.
    Message(T),
    /// Nothing usable yet: more bytes are needed, or a malformed message
    /// was discarded under a retrying policy.
    Pending,
    /// The stream has ended and nothing is left to decode.
    Ended,
}

/// Decode the next buffered message, applying `policy` to failures.
pub(crate) fn attempt<C, T>(codec: &C, buf: &mut BytesMut, policy: ReceivePolicy) -> Result<Attempt<T>>
where
    C: WireCodec,
    T: DeserializeOwned,
{
    match codec.decode(buf) {
        Ok(Some(value)) => Ok(Attempt::Message(value)),
        Ok(None) => Ok(Attempt::Pending),
        Err(err) => policy.absorb(err).map(|()| Attempt::Pending),
    }
}

/// Decode what is left after the stream reported end-of-stream.
pub(crate) fn attempt_eof<C, T>(
    codec: &C,
    buf: &mut BytesMut,
    policy: ReceivePolicy,
) -> Result<Attempt<T>>
where
    C: WireCodec,
    T: DeserializeOwned,
{
    match codec.decode_eof(buf) {
        Ok(Some(value)) => Ok(Attempt::Message(value)),
        Ok(None) => Ok(Attempt::Ended),
        Err(err) => policy.absorb(err).map(|()| Attempt::Pending),
    }
}
