//! Protocol helpers for [`AsyncMessageChannel`].

use streamchan_channel::{
    AsyncMessageChannel, CancellationToken, Outcome, ReceivePolicy, Result, WireCodec,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::exchange::acknowledged;
use crate::messages::{ResponseMessage, UploadMessage};

/// Async [`wait_for_response`](crate::wait_for_response).
pub async fn wait_for_response<S, C>(channel: &mut AsyncMessageChannel<S, C>) -> bool
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    match wait_for_response_outcome(channel, None).await {
        Ok(outcome) => acknowledged(outcome),
        Err(err) => {
            warn!(error = %err, "acknowledgement receive failed");
            false
        }
    }
}

pub async fn wait_for_response_outcome<S, C>(
    channel: &mut AsyncMessageChannel<S, C>,
    cancel: Option<&CancellationToken>,
) -> Result<Outcome<bool>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    let outcome = channel
        .receive_with::<ResponseMessage>(ReceivePolicy::ACKNOWLEDGEMENT, cancel)
        .await?;
    Ok(outcome.map(|response| response.ok))
}

/// Async [`wait_for_upload_message`](crate::wait_for_upload_message).
pub async fn wait_for_upload_message<S, C>(
    channel: &mut AsyncMessageChannel<S, C>,
) -> Option<UploadMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    match wait_for_upload_outcome(channel, None).await {
        Ok(outcome) => outcome.into_option(),
        Err(err) => {
            warn!(error = %err, "upload announcement receive failed");
            None
        }
    }
}

pub async fn wait_for_upload_outcome<S, C>(
    channel: &mut AsyncMessageChannel<S, C>,
    cancel: Option<&CancellationToken>,
) -> Result<Outcome<UploadMessage>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    let outcome = channel
        .receive_with::<UploadMessage>(ReceivePolicy::UPLOAD, cancel)
        .await?;
    if let Outcome::Delivered(upload) = &outcome {
        debug!(root = %upload.root, count = upload.count, "upload announced");
    }
    Ok(outcome)
}

pub async fn send_response<S, C>(channel: &mut AsyncMessageChannel<S, C>, ok: bool) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    channel.write_message(&ResponseMessage::new(ok)).await
}

pub async fn announce_upload<S, C>(
    channel: &mut AsyncMessageChannel<S, C>,
    upload: &UploadMessage,
) -> Result<bool>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: WireCodec,
{
    channel.write_message(upload).await?;
    Ok(wait_for_response(channel).await)
}
