use std::time::Duration;

/// Default time a receive call waits for a message.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read slice used when a cancellation token must be observed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest deadline a receive call will compute.
pub(crate) const MAX_RECEIVE_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for a message channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Deadline for each receive call. Default: 5 s.
    pub receive_timeout: Duration,
    /// Longest single blocking read while a cancellation token is attached.
    /// Without a token, reads wait for the whole remaining time.
    pub poll_interval: Duration,
    /// Write timeout applied before each write, if any.
    pub write_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_timeout: None,
        }
    }
}

impl ChannelConfig {
    /// Override the receive deadline.
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Override the cancellation poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set a write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }
}
