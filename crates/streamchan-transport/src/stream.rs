use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// An ordered, reliable, bidirectional byte channel.
///
/// Implementations must honor [`Stream::set_read_timeout`]: once a timeout is
/// set, a blocking `read` that sees no data within it returns an error of
/// kind `WouldBlock` or `TimedOut`. The receive loop in `streamchan-channel`
/// relies on this to keep every receive call inside its deadline.
pub trait Stream: Read + Write {
    /// Bound subsequent blocking reads. `None` blocks indefinitely.
    ///
    /// Callers never pass `Some(Duration::ZERO)`.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bound subsequent blocking writes. `None` blocks indefinitely.
    ///
    /// Streams without a write deadline may ignore this.
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let _ = timeout;
        Ok(())
    }
}

impl<S: Stream + ?Sized> Stream for &mut S {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_write_timeout(timeout)
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_write_timeout(timeout)
    }
}

#[cfg(unix)]
impl Stream for std::os::unix::net::UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout)
    }
}

impl Stream for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::ErrorKind;
    use std::os::unix::net::UnixStream;
    use std::time::Instant;

    use super::*;

    #[test]
    fn unix_read_timeout_bounds_blocking_read() {
        let (mut left, _right) = UnixStream::pair().unwrap();
        Stream::set_read_timeout(&mut left, Some(Duration::from_millis(30))).unwrap();

        let started = Instant::now();
        let mut buf = [0u8; 8];
        let err = left.read(&mut buf).unwrap_err();

        assert!(matches!(
            err.kind(),
            ErrorKind::WouldBlock | ErrorKind::TimedOut
        ));
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn mutable_reference_forwards_timeouts() {
        let (mut left, mut right) = UnixStream::pair().unwrap();
        {
            let mut borrowed: &mut UnixStream = &mut left;
            Stream::set_read_timeout(&mut borrowed, Some(Duration::from_millis(5))).unwrap();
        }
        // The kernel rounds socket timeouts up to its tick.
        assert!(left
            .read_timeout()
            .unwrap()
            .is_some_and(|t| t >= Duration::from_millis(5)));

        right.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        left.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
    }

    #[test]
    fn boxed_stream_is_a_stream() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut boxed: Box<UnixStream> = Box::new(left);
        Stream::set_write_timeout(&mut boxed, Some(Duration::from_millis(10))).unwrap();
        assert!(boxed
            .write_timeout()
            .unwrap()
            .is_some_and(|t| t >= Duration::from_millis(10)));
    }
}
