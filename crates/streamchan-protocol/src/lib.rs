//! The two fixed messages of the upload exchange and their helpers.
//!
//! A client announces an upload with an [`UploadMessage`]; the server answers
//! with a [`ResponseMessage`]. Each receive helper applies its own
//! [`ReceivePolicy`](streamchan_channel::ReceivePolicy):
//!
//! | helper                      | malformed data | end-of-stream     | timeout  |
//! |-----------------------------|----------------|-------------------|----------|
//! | [`wait_for_response`]       | retried        | waits to deadline | `false`  |
//! | [`wait_for_upload_message`] | retried        | `None` at once    | `None`   |
//!
//! The `*_outcome` variants return the full
//! [`Outcome`](streamchan_channel::Outcome) instead.

pub mod exchange;
pub mod messages;

#[cfg(feature = "async")]
pub mod nonblocking;

pub use exchange::{
    announce_upload, send_response, wait_for_response, wait_for_response_outcome,
    wait_for_upload_message, wait_for_upload_outcome,
};
pub use messages::{ResponseMessage, UploadMessage};
