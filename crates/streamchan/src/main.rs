mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use streamchan_channel::WireFormat;

use crate::cmd::{Command, Globals};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "streamchan", version, about = "Upload-intent exchange over Unix sockets")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Wire format spoken on the socket (binary, text).
    #[arg(long, value_name = "WIRE", default_value = "binary", global = true, env = "STREAMCHAN_WIRE")]
    wire: WireFormat,

    /// Receive deadline for each message (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s", global = true)]
    timeout: String,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = cmd::parse_duration(&cli.timeout).and_then(|receive_timeout| {
        let globals = Globals {
            format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
            wire: cli.wire,
            receive_timeout,
        };
        cmd::run(cli.command, &globals)
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
