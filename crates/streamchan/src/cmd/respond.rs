use streamchan_channel::MessageChannel;
use streamchan_protocol::send_response;
use streamchan_transport::connect_unix;
use tracing::info;

use crate::cmd::{Globals, RespondArgs};
use crate::exit::{channel_error, transport_error, CliResult, SUCCESS};

pub fn run(args: RespondArgs, globals: &Globals) -> CliResult<i32> {
    let stream =
        connect_unix(&args.path).map_err(|err| transport_error("connect failed", err))?;
    let mut channel = MessageChannel::with_config(stream, globals.wire, globals.channel_config());

    let ok = !args.reject;
    send_response(&mut channel, ok).map_err(|err| channel_error("send failed", err))?;
    info!(ok, "acknowledgement sent");

    Ok(SUCCESS)
}
