//! Byte stream abstraction for streamchan.
//!
//! The message layer never opens or closes connections. It only needs an
//! ordered, reliable, bidirectional byte channel whose blocking reads can be
//! bounded. That contract is the [`Stream`] trait defined here.
//!
//! Unix domain socket helpers are provided for the CLI and for tests; any
//! other transport (QUIC streams, TCP, in-process pipes) plugs in by
//! implementing [`Stream`].

pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::Stream;

#[cfg(unix)]
pub use uds::{connect_unix, SocketListener};
