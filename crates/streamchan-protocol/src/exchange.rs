use streamchan_channel::{
    CancellationToken, MessageChannel, Outcome, ReceivePolicy, Result, Stream, WireCodec,
};
use tracing::{debug, warn};

use crate::messages::{ResponseMessage, UploadMessage};

/// Wait for an acknowledgement and return its `ok` flag.
///
/// Malformed data is discarded and the wait continues. A closed stream is not
/// reported: the call idles until the deadline. So `false` means "rejected",
/// "never answered" or "stream failed" alike; use
/// [`wait_for_response_outcome`] to tell them apart.
pub fn wait_for_response<S, C>(channel: &mut MessageChannel<S, C>) -> bool
where
    S: Stream,
    C: WireCodec,
{
    match wait_for_response_outcome(channel, None) {
        Ok(outcome) => acknowledged(outcome),
        Err(err) => {
            warn!(error = %err, "acknowledgement receive failed");
            false
        }
    }
}

/// Wait for an acknowledgement, reporting how the wait ended.
pub fn wait_for_response_outcome<S, C>(
    channel: &mut MessageChannel<S, C>,
    cancel: Option<&CancellationToken>,
) -> Result<Outcome<bool>>
where
    S: Stream,
    C: WireCodec,
{
    let outcome = channel.receive_with::<ResponseMessage>(ReceivePolicy::ACKNOWLEDGEMENT, cancel)?;
    Ok(outcome.map(|response| response.ok))
}

/// Wait for an upload announcement.
///
/// Returns `None` as soon as the peer closes the stream, or once the deadline
/// passes. Malformed data is logged and the wait continues.
pub fn wait_for_upload_message<S, C>(channel: &mut MessageChannel<S, C>) -> Option<UploadMessage>
where
    S: Stream,
    C: WireCodec,
{
    match wait_for_upload_outcome(channel, None) {
        Ok(outcome) => outcome.into_option(),
        Err(err) => {
            warn!(error = %err, "upload announcement receive failed");
            None
        }
    }
}

/// Wait for an upload announcement, reporting how the wait ended.
pub fn wait_for_upload_outcome<S, C>(
    channel: &mut MessageChannel<S, C>,
    cancel: Option<&CancellationToken>,
) -> Result<Outcome<UploadMessage>>
where
    S: Stream,
    C: WireCodec,
{
    let outcome = channel.receive_with::<UploadMessage>(ReceivePolicy::UPLOAD, cancel)?;
    if let Outcome::Delivered(upload) = &outcome {
        debug!(root = %upload.root, count = upload.count, "upload announced");
    }
    Ok(outcome)
}

/// Send `ResponseMessage { ok }`. Errors are returned as-is.
pub fn send_response<S, C>(channel: &mut MessageChannel<S, C>, ok: bool) -> Result<()>
where
    S: Stream,
    C: WireCodec,
{
    channel.write_message(&ResponseMessage::new(ok))
}

/// Client half of the upload exchange: announce, then wait for the answer.
pub fn announce_upload<S, C>(
    channel: &mut MessageChannel<S, C>,
    upload: &UploadMessage,
) -> Result<bool>
where
    S: Stream,
    C: WireCodec,
{
    channel.write_message(upload)?;
    Ok(wait_for_response(channel))
}

pub(crate) fn acknowledged(outcome: Outcome<bool>) -> bool {
    match outcome {
        Outcome::Delivered(ok) => ok,
        Outcome::EndOfStream | Outcome::TimedOut | Outcome::Cancelled => false,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::thread;
    use std::time::{Duration, Instant};

    use bytes::BytesMut;
    use streamchan_channel::{Binary, ChannelConfig, ChannelError, Text, WireFormat};

    use super::*;

    fn config(ms: u64) -> ChannelConfig {
        ChannelConfig::default().with_receive_timeout(Duration::from_millis(ms))
    }

    fn upload() -> UploadMessage {
        UploadMessage::new("bafyroot", 4, "02abcdef", "3045deadbeef")
            .with_leaf(vec![0xa1, 0x00, 0xff])
            .with_parent("bafyparent")
    }

    fn frame<T: serde::Serialize>(value: &T) -> BytesMut {
        let mut buf = BytesMut::new();
        Binary::new().encode(value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn response_within_one_unit_is_accepted() {
        // One unit = 10 ms; deadline is five units.
        let (left, mut right) = UnixStream::pair().unwrap();
        let peer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            right.write_all(&frame(&ResponseMessage::ACCEPTED)).unwrap();
            right
        });

        let mut channel = MessageChannel::with_config(left, Binary::new(), config(50));
        assert!(wait_for_response(&mut channel));
        drop(peer.join().unwrap());
    }

    #[test]
    fn silence_for_six_units_is_rejected_at_deadline() {
        let (left, right) = UnixStream::pair().unwrap();
        let peer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            drop(right);
        });

        let mut channel = MessageChannel::with_config(left, Binary::new(), config(50));
        let started = Instant::now();
        assert!(!wait_for_response(&mut channel));
        assert!(started.elapsed() >= Duration::from_millis(50));
        peer.join().unwrap();
    }

    #[test]
    fn explicit_rejection_and_silence_look_the_same() {
        let (left, mut right) = UnixStream::pair().unwrap();
        right.write_all(&frame(&ResponseMessage::REJECTED)).unwrap();
        let mut rejected = MessageChannel::with_config(left, Binary::new(), config(200));

        let (quiet_left, _quiet_right) = UnixStream::pair().unwrap();
        let mut silent = MessageChannel::with_config(quiet_left, Binary::new(), config(40));

        assert_eq!(wait_for_response(&mut rejected), wait_for_response(&mut silent));

        // The outcome form keeps the difference.
        right.write_all(&frame(&ResponseMessage::REJECTED)).unwrap();
        assert_eq!(
            wait_for_response_outcome(&mut rejected, None).unwrap(),
            Outcome::Delivered(false)
        );
        assert_eq!(
            wait_for_response_outcome(&mut silent, None).unwrap(),
            Outcome::TimedOut
        );
    }

    #[test]
    fn response_waits_out_closed_stream() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(right);
        let mut channel = MessageChannel::with_config(left, Text::new(), config(60));

        let started = Instant::now();
        assert!(!wait_for_response(&mut channel));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn response_skips_malformed_data() {
        let (left, mut right) = UnixStream::pair().unwrap();
        right.write_all(b"{\"ok\":maybe}\n{\"ok\":true}\n").unwrap();
        let mut channel = MessageChannel::with_config(left, Text::new(), config(500));
        assert!(wait_for_response(&mut channel));
    }

    #[test]
    fn upload_on_closed_stream_returns_before_deadline() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(right);
        let mut channel = MessageChannel::with_config(left, Binary::new(), config(2_000));

        let started = Instant::now();
        assert_eq!(wait_for_upload_message(&mut channel), None);
        assert!(started.elapsed() < Duration::from_millis(2_000));
    }

    #[test]
    fn upload_times_out_as_absent() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut channel = MessageChannel::with_config(left, Binary::new(), config(50));

        let started = Instant::now();
        assert_eq!(wait_for_upload_message(&mut channel), None);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn upload_survives_malformed_prefix() {
        let (left, mut right) = UnixStream::pair().unwrap();
        let peer = thread::spawn(move || {
            right.write_all(b"\xde\xad\xbe\xef").unwrap();
            thread::sleep(Duration::from_millis(20));
            right.write_all(&frame(&upload())).unwrap();
            right
        });

        let mut channel = MessageChannel::with_config(left, Binary::new(), config(1_000));
        assert_eq!(wait_for_upload_message(&mut channel), Some(upload()));
        drop(peer.join().unwrap());
    }

    #[test]
    fn upload_outcome_distinguishes_end_of_stream() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(right);
        let mut channel = MessageChannel::with_config(left, Text::new(), config(500));
        assert_eq!(
            wait_for_upload_outcome(&mut channel, None).unwrap(),
            Outcome::EndOfStream
        );
    }

    #[test]
    fn announce_and_acknowledge_roundtrip() {
        for format in [WireFormat::Binary, WireFormat::Text] {
            let (client_end, server_end) = UnixStream::pair().unwrap();

            let server = thread::spawn(move || {
                let mut channel = MessageChannel::with_config(server_end, format, config(1_000));
                let got = wait_for_upload_message(&mut channel).expect("upload announced");
                send_response(&mut channel, got.count == 4).unwrap();
                got
            });

            let mut client = MessageChannel::with_config(client_end, format, config(1_000));
            assert!(announce_upload(&mut client, &upload()).unwrap());
            assert_eq!(server.join().unwrap(), upload());
        }
    }

    #[test]
    fn send_response_reports_write_failure() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(right);
        let mut channel = MessageChannel::new(left, WireFormat::Binary);
        let err = send_response(&mut channel, true).unwrap_err();
        assert!(matches!(err, ChannelError::Io(_)));
    }

    #[test]
    fn cancelled_wait_is_not_an_acknowledgement() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut channel = MessageChannel::with_config(left, Binary::new(), config(5_000));
        let token = CancellationToken::new();
        token.cancel();

        let outcome = wait_for_response_outcome(&mut channel, Some(&token)).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(!acknowledged(outcome));
    }
}
