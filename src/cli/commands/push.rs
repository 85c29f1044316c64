//! Push command - drive a receive session from a local directory
//!
//! Walks the source index, asks the receiver which files it already
//! holds, streams the rest and then switches (or merges) the result in.
//! A failure before the switch aborts the session; a failed switch
//! leaves staging and trash for `reshelve recover`.

use crate::cli::output::{colors, format_bytes, format_millis, print_success, print_warning};
use crate::cli::OutputFormat;
use crate::core::layout::MANIFEST_FILE;
use crate::core::replication::ReplicationReceiver;
use crate::core::services::Services;
use crate::core::types::SwapReport;
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Arguments for the push command
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Directory holding the new version of the index
    pub source: PathBuf,

    /// Index to update
    #[arg(long, short = 'i')]
    pub index: String,

    /// Merge the source in as an incremental update instead of replacing
    #[arg(long, short = 'm')]
    pub merge: bool,
}

/// Arguments for the abort command
#[derive(Args, Debug)]
pub struct AbortArgs {
    /// Index name
    pub name: String,
}

/// What the transfer phase did
#[derive(Debug, Default, Serialize)]
pub struct TransferStats {
    pub dirs: usize,
    pub files_sent: usize,
    pub files_skipped: usize,
    pub bytes_sent: u64,
}

/// Push result response
#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub index: String,
    pub source: String,
    pub mode: &'static str,
    pub transfer: TransferStats,
    pub swap: SwapReport,
}

/// Send every entry under `source`; skipping unchanged files unless merging
pub fn transfer(
    receiver: &ReplicationReceiver,
    index: &str,
    source: &Path,
    diff: bool,
) -> Result<TransferStats, Box<dyn std::error::Error>> {
    let mut stats = TransferStats::default();

    for entry in WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)?
            .to_string_lossy()
            .replace('\\', "/");

        if entry.file_type().is_dir() {
            receiver.mkdir(index, &rel)?;
            stats.dirs += 1;
            continue;
        }

        // Engine lock files and stray manifests never travel
        if rel.ends_with(".lock") || rel == MANIFEST_FILE {
            tracing::debug!("Skipping {}", rel);
            continue;
        }

        let metadata = entry.metadata()?;
        let mtime = metadata.modified()?;
        if diff && receiver.file_exists(index, &rel, mtime, metadata.len())? {
            stats.files_skipped += 1;
            continue;
        }

        let body = BufReader::new(File::open(entry.path())?);
        stats.bytes_sent += receiver.put_file(index, &rel, mtime, body)?;
        stats.files_sent += 1;
    }

    Ok(stats)
}

/// Execute the push command
pub async fn execute(
    args: PushArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.source.is_dir() {
        return Err(format!("Source '{}' is not a directory", args.source.display()).into());
    }
    let receiver = &services.receiver;

    receiver.init(&args.index)?;
    let transfer = match transfer(receiver, &args.index, &args.source, !args.merge) {
        Ok(stats) => stats,
        Err(e) => {
            if let Err(abort) = receiver.abort(&args.index) {
                print_warning(&format!("Abort after failed transfer also failed: {abort}"));
            }
            return Err(e);
        }
    };

    let swap = if args.merge {
        receiver.merge_in(&args.index)?
    } else {
        receiver.switch_in(&args.index)?
    };

    let response = PushResponse {
        index: args.index,
        source: args.source.to_string_lossy().into_owned(),
        mode: if args.merge { "merge" } else { "switch" },
        transfer,
        swap,
    };

    match format {
        OutputFormat::Human => {
            println!(
                "{} '{}' ({})",
                colors::success("Pushed"),
                colors::index_name(&response.index),
                response.mode
            );
            println!(
                "  {}: {} sent ({}), {} unchanged",
                colors::label("Files"),
                colors::number(&response.transfer.files_sent.to_string()),
                format_bytes(response.transfer.bytes_sent),
                colors::number(&response.transfer.files_skipped.to_string())
            );
            if response.swap.files_reused > 0 {
                println!(
                    "  {}: {}",
                    colors::label("Reused from previous version"),
                    colors::number(&response.swap.files_reused.to_string())
                );
            }
            if !response.swap.dependents.is_empty() {
                println!(
                    "  {}: {}",
                    colors::label("Reopened composites"),
                    response.swap.dependents.join(", ")
                );
            }
            println!(
                "  {}: {}",
                colors::label("Swap time"),
                colors::number(&format_millis(response.swap.duration_ms))
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Execute the abort command
pub async fn execute_abort(
    args: AbortArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    services.receiver.abort(&args.name)?;

    match format {
        OutputFormat::Human => {
            print_success(&format!("Aborted receive session for '{}'", args.name));
        }
        OutputFormat::Json => {
            let response = serde_json::json!({
                "aborted": true,
                "name": args.name
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
