//! One upload exchange over a socket pair: the client announces, the server
//! acknowledges.
//!
//! Run with:
//!   cargo run --example upload-exchange

use std::os::unix::net::UnixStream;
use std::thread;

use streamchan::protocol::{announce_upload, send_response, wait_for_upload_message};
use streamchan::{MessageChannel, UploadMessage, WireFormat};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (client_end, server_end) = UnixStream::pair()?;

    let server = thread::spawn(move || -> Result<(), streamchan::ChannelError> {
        let mut channel = MessageChannel::new(server_end, WireFormat::Text);
        match wait_for_upload_message(&mut channel) {
            Some(upload) => {
                eprintln!("server: upload of {} leaves under {}", upload.count, upload.root);
                send_response(&mut channel, true)
            }
            None => {
                eprintln!("server: no upload announced");
                Ok(())
            }
        }
    });

    let upload = UploadMessage::new("bafy-example-root", 3, "02ab", "3045")
        .with_leaf(b"leaf-0".to_vec());
    let mut channel = MessageChannel::new(client_end, WireFormat::Text);
    let accepted = announce_upload(&mut channel, &upload)?;
    eprintln!("client: accepted={accepted}");

    server.join().map_err(|_| "server thread panicked")??;
    Ok(())
}
