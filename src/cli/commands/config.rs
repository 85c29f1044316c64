//! Config command - show current configuration

use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::services::Services;
use crate::core::xdg::XdgDirs;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the effective configuration as TOML
    #[arg(long)]
    pub toml: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub config_file: String,
    pub data_root: String,
    pub lock_timeout_ms: u64,
    pub reserved_names: Vec<String>,
    pub writer_heap_bytes: usize,
    pub targets: usize,
}

/// Effective configuration with target secrets masked
fn redacted(config: &Config) -> Config {
    let mut copy = config.clone();
    copy.replication.targets = copy
        .replication
        .targets
        .iter()
        .map(|t| t.redacted())
        .collect();
    copy
}

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = &services.config;

    if args.toml {
        print!("{}", toml::to_string_pretty(&redacted(config))?);
        return Ok(());
    }

    let response = ConfigResponse {
        config_file: XdgDirs::new().config_file().to_string_lossy().into_owned(),
        data_root: config.storage.data_root.to_string_lossy().into_owned(),
        lock_timeout_ms: config.catalog.lock_timeout_ms,
        reserved_names: config.catalog.reserved_names.clone(),
        writer_heap_bytes: config.catalog.writer_heap_bytes,
        targets: config.replication.targets.len(),
    };

    match format {
        OutputFormat::Human => {
            println!("{}:", colors::label("Configuration"));
            println!("  config_file: {}", colors::file_path(&response.config_file));
            println!("  storage:");
            println!("    data_root: {}", colors::file_path(&response.data_root));
            println!("  catalog:");
            println!(
                "    lock_timeout_ms: {}",
                colors::number(&response.lock_timeout_ms.to_string())
            );
            println!("    reserved_names: {:?}", response.reserved_names);
            println!(
                "    writer_heap_bytes: {}",
                colors::number(&response.writer_heap_bytes.to_string())
            );
            println!("  replication:");
            println!(
                "    targets: {}",
                colors::number(&response.targets.to_string())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
