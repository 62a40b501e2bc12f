use std::fs;

use streamchan_channel::MessageChannel;
use streamchan_protocol::{announce_upload, UploadMessage};
use streamchan_transport::connect_unix;

use crate::cmd::{Globals, UploadArgs};
use crate::exit::{channel_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::print_ack;

pub fn run(args: UploadArgs, globals: &Globals) -> CliResult<i32> {
    let upload = build_upload(&args)?;

    let stream =
        connect_unix(&args.path).map_err(|err| transport_error("connect failed", err))?;
    let mut channel = MessageChannel::with_config(stream, globals.wire, globals.channel_config());

    let accepted =
        announce_upload(&mut channel, &upload).map_err(|err| channel_error("send failed", err))?;
    print_ack(&upload.root, accepted, globals.format);

    Ok(if accepted { SUCCESS } else { FAILURE })
}

fn build_upload(args: &UploadArgs) -> CliResult<UploadMessage> {
    let mut upload = UploadMessage::new(
        args.root.as_str(),
        args.count,
        args.public_key.as_str(),
        args.signature.as_str(),
    );
    if let Some(parent) = &args.parent {
        upload = upload.with_parent(parent.as_str());
    }
    if let Some(path) = &args.leaf_file {
        let leaf = fs::read(path).map_err(|err| {
            CliError::new(USAGE, format!("failed reading {}: {err}", path.display()))
        })?;
        upload = upload.with_leaf(leaf);
    }
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args() -> UploadArgs {
        UploadArgs {
            path: PathBuf::from("/tmp/unused.sock"),
            root: "bafyroot".to_string(),
            count: 2,
            public_key: "pk".to_string(),
            signature: "sig".to_string(),
            parent: Some("bafyparent".to_string()),
            leaf_file: None,
        }
    }

    #[test]
    fn builds_upload_from_flags() {
        let upload = build_upload(&args()).unwrap();
        assert_eq!(upload.root, "bafyroot");
        assert_eq!(upload.parent.as_deref(), Some("bafyparent"));
        assert!(upload.leaf.is_empty());
    }

    #[test]
    fn missing_leaf_file_is_reported() {
        let mut args = args();
        args.leaf_file = Some(PathBuf::from("/nonexistent/streamchan/leaf.bin"));
        let err = build_upload(&args).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("leaf.bin"));
    }
}
