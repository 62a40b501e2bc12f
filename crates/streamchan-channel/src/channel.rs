use std::io::{self, ErrorKind};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use streamchan_codec::{WireCodec, WireFormat};
use streamchan_transport::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{ChannelConfig, MAX_RECEIVE_TIMEOUT};
use crate::error::{ChannelError, Result};
use crate::policy::{attempt, attempt_eof, Attempt, EndOfStreamPolicy, Outcome, ReceivePolicy};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Smallest read timeout handed to the stream; zero means "block forever"
/// to some platforms and is rejected by others.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Typed message exchange over one caller-owned stream.
///
/// The channel keeps a read buffer for its stream: bytes that arrive behind
/// a delivered message stay buffered for the next receive call on the same
/// channel. Separate channels share nothing.
///
/// Every operation takes `&mut self`, so at most one exchange is in flight
/// per stream. Pass `&mut stream` to keep ownership with the caller; the
/// channel never closes the stream. The last read timeout set by a receive
/// call is left on the stream.
pub struct MessageChannel<S, C = WireFormat> {
    stream: S,
    codec: C,
    config: ChannelConfig,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl<S: Stream, C: WireCodec> MessageChannel<S, C> {
    /// Create a channel with default configuration.
    pub fn new(stream: S, codec: C) -> Self {
        Self::with_config(stream, codec, ChannelConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(stream: S, codec: C, config: ChannelConfig) -> Self {
        Self {
            stream,
            codec,
            config,
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            write_buf: BytesMut::new(),
        }
    }

    /// Encode `value` and write it to the stream once.
    ///
    /// Encode and write failures are returned as-is; nothing is retried.
    pub fn write_message<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.write_buf.clear();
        self.codec.encode(value, &mut self.write_buf)?;

        if let Some(timeout) = self.config.write_timeout {
            self.stream.set_write_timeout(Some(timeout))?;
        }

        let mut offset = 0usize;
        while offset < self.write_buf.len() {
            match self.stream.write(&self.write_buf[offset..]) {
                Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero).into()),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        trace!(codec = self.codec.name(), bytes = offset, "message written");
        Ok(())
    }

    /// Wait up to the configured receive timeout for one message.
    ///
    /// - timeout → [`ChannelError::Timeout`]
    /// - clean end-of-stream → [`ChannelError::EndOfStream`]
    /// - malformed or partial data → [`ChannelError::Codec`], without retry
    pub fn read_message<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.read_message_within(self.config.receive_timeout)
    }

    /// Like [`MessageChannel::read_message`] with an explicit deadline.
    pub fn read_message_within<T: DeserializeOwned>(&mut self, timeout: Duration) -> Result<T> {
        let outcome = self.receive(ReceivePolicy::STRICT, timeout, None)?;
        outcome.into_result(timeout)
    }

    /// Like [`MessageChannel::read_message`], returning
    /// [`ChannelError::Cancelled`] once `cancel` fires.
    pub fn read_message_cancellable<T: DeserializeOwned>(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let timeout = self.config.receive_timeout;
        let outcome = self.receive(ReceivePolicy::STRICT, timeout, Some(cancel))?;
        outcome.into_result(timeout)
    }

    /// Wait for one message under `policy` and the configured deadline.
    pub fn receive_with<T: DeserializeOwned>(
        &mut self,
        policy: ReceivePolicy,
        cancel: Option<&CancellationToken>,
    ) -> Result<Outcome<T>> {
        self.receive(policy, self.config.receive_timeout, cancel)
    }

    /// Wait for one message under `policy`, returning no later than
    /// `timeout` from now (plus scheduling slack).
    ///
    /// `Err` is only returned for failures the policy does not absorb:
    /// malformed data under [`ReceivePolicy::STRICT`] and hard I/O errors.
    pub fn receive<T: DeserializeOwned>(
        &mut self,
        policy: ReceivePolicy,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Outcome<T>> {
        let deadline = Instant::now() + timeout.min(MAX_RECEIVE_TIMEOUT);

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!("receive cancelled");
                return Ok(Outcome::Cancelled);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(?timeout, "receive timed out");
                return Ok(Outcome::TimedOut);
            }

            let before = self.read_buf.len();
            match attempt(&self.codec, &mut self.read_buf, policy)? {
                Attempt::Message(value) => return Ok(Outcome::Delivered(value)),
                // A malformed message was dropped; the rest may already decode.
                Attempt::Pending if self.read_buf.len() < before => continue,
                Attempt::Pending | Attempt::Ended => {}
            }

            let remaining = deadline - now;
            let budget = match cancel {
                Some(_) => remaining.min(self.config.poll_interval),
                None => remaining,
            };

            match self.fill(budget) {
                Ok(0) => match attempt_eof(&self.codec, &mut self.read_buf, policy)? {
                    Attempt::Message(value) => return Ok(Outcome::Delivered(value)),
                    Attempt::Pending => {}
                    Attempt::Ended => match policy.end_of_stream {
                        EndOfStreamPolicy::Stop => {
                            debug!("stream ended before a message arrived");
                            return Ok(Outcome::EndOfStream);
                        }
                        // Nothing more can arrive; idle instead of spinning on
                        // zero-length reads.
                        EndOfStreamPolicy::WaitForDeadline => std::thread::sleep(budget),
                    },
                },
                Ok(_) => {}
                Err(err) if is_read_timeout(&err) => {}
                Err(err) => {
                    warn!(error = %err, "stream read failed");
                    return Err(ChannelError::Io(err));
                }
            }
        }
    }

    /// Read once, blocking for at most `budget`.
    fn fill(&mut self, budget: Duration) -> io::Result<usize> {
        self.stream
            .set_read_timeout(Some(budget.max(MIN_READ_TIMEOUT)))?;

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = self.stream.read(&mut chunk)?;
        self.read_buf.extend_from_slice(&chunk[..read]);
        trace!(read, buffered = self.read_buf.len(), "stream read");
        Ok(read)
    }

    /// Bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.read_buf.len()
    }

    /// The codec in use.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Current channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Replace the channel configuration.
    pub fn set_config(&mut self, config: ChannelConfig) {
        self.config = config;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the channel, returning the stream and any undecoded bytes.
    pub fn into_parts(self) -> (S, BytesMut) {
        (self.stream, self.read_buf)
    }

    /// Consume the channel and return the stream. Undecoded bytes are dropped.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn is_read_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

impl<S, C> std::fmt::Debug for MessageChannel<S, C>
where
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .field("buffered", &self.read_buf.len())
            .finish_non_exhaustive()
    }
}
