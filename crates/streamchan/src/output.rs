use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use streamchan_protocol::UploadMessage;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    event: &'static str,
    root: &'a str,
    count: u64,
    leaf_size: usize,
    parent: Option<&'a str>,
    public_key: &'a str,
    signature: &'a str,
    accepted: bool,
    timestamp: String,
}

/// One line (or table) per received upload announcement.
pub fn print_upload(upload: &UploadMessage, accepted: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = UploadOutput {
                event: "upload-received",
                root: &upload.root,
                count: upload.count,
                leaf_size: upload.leaf.len(),
                parent: upload.parent.as_deref(),
                public_key: &upload.public_key,
                signature: &upload.signature,
                accepted,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROOT", "COUNT", "LEAF", "PARENT", "KEY", "ACCEPTED"])
                .add_row(vec![
                    upload.root.clone(),
                    upload.count.to_string(),
                    format!("{} bytes", upload.leaf.len()),
                    upload.parent.clone().unwrap_or_else(|| "-".to_string()),
                    upload.public_key.clone(),
                    accepted.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "root={} count={} leaf={}B parent={} key={} accepted={}",
                upload.root,
                upload.count,
                upload.leaf.len(),
                upload.parent.as_deref().unwrap_or("-"),
                upload.public_key,
                accepted
            );
        }
    }
}

#[derive(Serialize)]
struct AckOutput<'a> {
    event: &'static str,
    root: &'a str,
    accepted: bool,
    timestamp: String,
}

/// Result of a client-side upload announcement.
pub fn print_ack(root: &str, accepted: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = AckOutput {
                event: "upload-acknowledged",
                root,
                accepted,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROOT", "ACCEPTED"])
                .add_row(vec![root.to_string(), accepted.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("root={root} accepted={accepted}"),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
