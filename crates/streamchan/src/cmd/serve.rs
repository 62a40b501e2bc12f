use std::thread;

use streamchan_channel::{
    CancellationToken, MessageChannel, Outcome, Stream, WireCodec, DEFAULT_POLL_INTERVAL,
};
use streamchan_protocol::{send_response, wait_for_upload_outcome, UploadMessage};
use streamchan_transport::SocketListener;
use tracing::{debug, info, warn};

use crate::cmd::{Globals, ServeArgs};
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::print_upload;

pub fn run(args: ServeArgs, globals: &Globals) -> CliResult<i32> {
    let listener =
        SocketListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;

    let shutdown = CancellationToken::new();
    install_ctrlc_handler(shutdown.clone())?;

    let accept = !args.reject;
    let mut handled = 0usize;

    while !shutdown.is_cancelled() {
        let stream = match listener.try_accept() {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                thread::sleep(DEFAULT_POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(transport_error("accept failed", err)),
        };

        let config = globals.channel_config();
        let mut channel = MessageChannel::with_config(stream, globals.wire, config);

        let upload = match wait_for_upload_outcome(&mut channel, Some(&shutdown)) {
            Ok(Outcome::Delivered(upload)) => upload,
            Ok(Outcome::Cancelled) => break,
            Ok(Outcome::EndOfStream) => {
                debug!("client closed without announcing an upload");
                continue;
            }
            Ok(Outcome::TimedOut) => {
                info!(timeout = ?globals.receive_timeout, "no upload announced before deadline");
                continue;
            }
            Err(err) => {
                warn!(error = %err, "dropping connection");
                continue;
            }
        };

        let accepted = reply(&mut channel, &upload, accept);
        print_upload(&upload, accepted, globals.format);
        handled = handled.saturating_add(1);

        if args.count.is_some_and(|count| handled >= count) {
            break;
        }
    }

    Ok(SUCCESS)
}

/// Send the verdict. Reports acceptance only if the peer was actually told.
fn reply<S, C>(channel: &mut MessageChannel<S, C>, upload: &UploadMessage, accept: bool) -> bool
where
    S: Stream,
    C: WireCodec,
{
    match send_response(channel, accept) {
        Ok(()) => accept,
        Err(err) => {
            warn!(error = %err, root = %upload.root, "acknowledgement not delivered");
            false
        }
    }
}

fn install_ctrlc_handler(shutdown: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
