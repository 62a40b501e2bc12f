use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use streamchan_channel::{ChannelConfig, WireFormat};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod respond;
pub mod serve;
pub mod upload;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept upload announcements and acknowledge them.
    Serve(ServeArgs),
    /// Announce an upload and wait for the acknowledgement.
    Upload(UploadArgs),
    /// Send a single acknowledgement.
    Respond(RespondArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Globals {
    pub format: OutputFormat,
    pub wire: WireFormat,
    pub receive_timeout: Duration,
}

impl Globals {
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::default()
            .with_receive_timeout(self.receive_timeout)
            .with_write_timeout(self.receive_timeout)
    }
}

pub fn run(command: Command, globals: &Globals) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, globals),
        Command::Upload(args) => upload::run(args, globals),
        Command::Respond(args) => respond::run(args, globals),
        Command::Version(args) => version::run(args, globals),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Reject every upload instead of accepting it.
    #[arg(long)]
    pub reject: bool,
    /// Exit after handling N uploads.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Content root identifier.
    #[arg(long)]
    pub root: String,
    /// Number of leaves in the upload.
    #[arg(long)]
    pub count: u64,
    /// Submitter public key.
    #[arg(long)]
    pub public_key: String,
    /// Signature over the root.
    #[arg(long)]
    pub signature: String,
    /// Parent root, for content added under an existing root.
    #[arg(long)]
    pub parent: Option<String>,
    /// File holding the encoded leaf.
    #[arg(long, value_name = "FILE")]
    pub leaf_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RespondArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Send `ok: false`.
    #[arg(long)]
    pub reject: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("0s").unwrap_err().code, USAGE);
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn globals_carry_timeout_into_channel_config() {
        let globals = Globals {
            format: OutputFormat::Json,
            wire: WireFormat::Text,
            receive_timeout: Duration::from_millis(750),
        };
        let config = globals.channel_config();
        assert_eq!(config.receive_timeout, Duration::from_millis(750));
        assert_eq!(config.write_timeout, Some(Duration::from_millis(750)));
    }
}
