//! Timeout-bounded typed message exchange over byte streams.
//!
//! streamchan speaks a small application protocol over any ordered,
//! reliable byte stream: a peer announces an upload, the other side
//! acknowledges it. Every receive returns by its deadline, even when the
//! peer never writes.
//!
//! # Crate Structure
//!
//! - [`transport`] — the `Stream` trait and Unix domain socket helpers
//! - [`codec`] — binary (framed CBOR) and text (JSON lines) wire formats
//! - [`channel`] — `MessageChannel`, receive policies and outcomes
//! - [`protocol`] — `ResponseMessage`, `UploadMessage` and their helpers

/// Re-export transport types.
pub mod transport {
    pub use streamchan_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use streamchan_codec::*;
}

/// Re-export channel types.
pub mod channel {
    pub use streamchan_channel::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use streamchan_protocol::*;
}

pub use streamchan_channel::{
    CancellationToken, ChannelConfig, ChannelError, MessageChannel, Outcome, ReceivePolicy,
    WireFormat,
};
pub use streamchan_protocol::{ResponseMessage, UploadMessage};
