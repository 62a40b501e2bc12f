//! Deadline-bounded typed message exchange over a byte stream.
//!
//! A [`MessageChannel`] wraps one caller-owned [`Stream`] and one codec and
//! offers two primitives:
//! - [`MessageChannel::write_message`]: encode and write one value, no retry
//! - [`MessageChannel::read_message`]: wait for one value, never past the
//!   receive deadline
//!
//! The deadline is enforced on the stream read itself: each blocking read is
//! given the time left until the deadline as its read timeout, so a peer that
//! never writes cannot hold a receive call hostage.
//!
//! [`ReceivePolicy`] decides what happens on malformed data and on
//! end-of-stream; [`Outcome`] reports how a receive call ended.

pub mod channel;
pub mod config;
pub mod error;
pub mod policy;

#[cfg(feature = "async")]
pub mod nonblocking;

pub use channel::MessageChannel;
pub use config::{ChannelConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RECEIVE_TIMEOUT};
pub use error::{ChannelError, Result};
pub use policy::{EndOfStreamPolicy, Outcome, ReceivePolicy};

#[cfg(feature = "async")]
pub use nonblocking::AsyncMessageChannel;

pub use streamchan_codec::{Binary, Text, WireCodec, WireFormat};
pub use streamchan_transport::Stream;
pub use tokio_util::sync::CancellationToken;
