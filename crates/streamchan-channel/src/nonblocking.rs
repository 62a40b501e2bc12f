//! Async counterpart of [`MessageChannel`](crate::MessageChannel) for tokio
//! streams.

use std::io::ErrorKind;
use std::time::Duration;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use streamchan_codec::{WireCodec, WireFormat};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{ChannelConfig, MAX_RECEIVE_TIMEOUT};
use crate::error::{ChannelError, Result};
use crate::policy::{attempt, attempt_eof, Attempt, EndOfStreamPolicy, Outcome, ReceivePolicy};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Typed message exchange over an async stream.
///
/// Same semantics as [`MessageChannel`](crate::MessageChannel): one
/// persistent read buffer per channel, one deadline per receive call. The
/// deadline and the cancellation token race the read itself, so neither
/// depends on stream read timeouts.
pub struct AsyncMessageChannel<S, C = WireFormat> {
    stream: S,
    codec: C,
    config: ChannelConfig,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl<S, C> AsyncMessageChannel<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    pub fn new(stream: S, codec: C) -> Self {
        Self::with_config(stream, codec, ChannelConfig::default())
    }

    pub fn with_config(stream: S, codec: C, config: ChannelConfig) -> Self {
        Self {
            stream,
            codec,
            config,
            read_buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            write_buf: BytesMut::new(),
        }
    }

    /// Encode `value` and write it once. Honors the configured write timeout.
    pub async fn write_message<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.write_buf.clear();
        self.codec.encode(value, &mut self.write_buf)?;

        let limit = self.config.write_timeout;
        let (stream, frame) = (&mut self.stream, &self.write_buf);
        let write = async move {
            stream.write_all(frame).await?;
            stream.flush().await
        };

        match limit {
            Some(limit) => tokio::time::timeout(limit, write)
                .await
                .map_err(|_| std::io::Error::from(ErrorKind::TimedOut))??,
            None => write.await?,
        }

        trace!(codec = self.codec.name(), bytes = self.write_buf.len(), "message written");
        Ok(())
    }

    pub async fn read_message<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.read_message_within(self.config.receive_timeout).await
    }

    pub async fn read_message_within<T: DeserializeOwned>(&mut self, timeout: Duration) -> Result<T> {
        let outcome = self.receive(ReceivePolicy::STRICT, timeout, None).await?;
        outcome.into_result(timeout)
    }

    pub async fn read_message_cancellable<T: DeserializeOwned>(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let timeout = self.config.receive_timeout;
        let outcome = self
            .receive(ReceivePolicy::STRICT, timeout, Some(cancel))
            .await?;
        outcome.into_result(timeout)
    }

    pub async fn receive_with<T: DeserializeOwned>(
        &mut self,
        policy: ReceivePolicy,
        cancel: Option<&CancellationToken>,
    ) -> Result<Outcome<T>> {
        self.receive(policy, self.config.receive_timeout, cancel)
            .await
    }

    /// Wait for one message under `policy`, racing the read against the
    /// deadline and `cancel`.
    pub async fn receive<T: DeserializeOwned>(
        &mut self,
        policy: ReceivePolicy,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Outcome<T>> {
        let deadline = Instant::now() + timeout.min(MAX_RECEIVE_TIMEOUT);
        let mut ended = false;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!("receive cancelled");
                return Ok(Outcome::Cancelled);
            }
            if Instant::now() >= deadline {
                debug!(?timeout, "receive timed out");
                return Ok(Outcome::TimedOut);
            }

            let before = self.read_buf.len();
            let decoded = if ended {
                attempt_eof(&self.codec, &mut self.read_buf, policy)?
            } else {
                attempt(&self.codec, &mut self.read_buf, policy)?
            };
            match decoded {
                Attempt::Message(value) => return Ok(Outcome::Delivered(value)),
                Attempt::Pending if self.read_buf.len() < before => continue,
                Attempt::Ended => match policy.end_of_stream {
                    EndOfStreamPolicy::Stop => {
                        debug!("stream ended before a message arrived");
                        return Ok(Outcome::EndOfStream);
                    }
                    EndOfStreamPolicy::WaitForDeadline => {
                        tokio::select! {
                            biased;
                            _ = cancelled(cancel) => return Ok(Outcome::Cancelled),
                            _ = sleep_until(deadline) => continue,
                        }
                    }
                },
                Attempt::Pending => {}
            }

            self.read_buf.reserve(READ_CHUNK_SIZE);
            tokio::select! {
                biased;
                _ = cancelled(cancel) => {
                    debug!("receive cancelled");
                    return Ok(Outcome::Cancelled);
                }
                _ = sleep_until(deadline) => {
                    debug!(?timeout, "receive timed out");
                    return Ok(Outcome::TimedOut);
                }
                read = self.stream.read_buf(&mut self.read_buf) => match read {
                    Ok(0) => ended = true,
                    Ok(read) => trace!(read, buffered = self.read_buf.len(), "stream read"),
                    Err(err) if err.kind() == ErrorKind::Interrupted => {}
                    Err(err) => {
                        warn!(error = %err, "stream read failed");
                        return Err(ChannelError::Io(err));
                    }
                },
            }
        }
    }

    pub fn buffered(&self) -> usize {
        self.read_buf.len()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
