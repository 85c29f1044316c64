//! Targets command - list configured replication targets

use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::replication::ReplicationDescriptor;
use crate::core::services::Services;
use clap::Args;
use std::sync::Arc;

/// Arguments for the targets command
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Show a single target
    pub name: Option<String>,
}

/// Execute the targets command
pub async fn execute(
    args: TargetsArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let targets: Vec<ReplicationDescriptor> = match &args.name {
        Some(name) => {
            let target = services
                .target(name)
                .ok_or_else(|| format!("No replication target named '{name}'"))?;
            vec![target.snapshot().redacted()]
        }
        None => services
            .targets
            .iter()
            .map(|t| t.snapshot().redacted())
            .collect(),
    };

    match format {
        OutputFormat::Human => {
            if targets.is_empty() {
                println!(
                    "No replication targets. Add [[replication.targets]] to {}.",
                    colors::file_path(&crate::core::xdg::XdgDirs::new().config_file().to_string_lossy())
                );
                return Ok(());
            }
            println!(
                "{} ({}):",
                colors::label("Replication targets"),
                colors::number(&targets.len().to_string())
            );
            for target in &targets {
                println!(
                    "  {:<20} {:<16} {}  {}",
                    colors::index_name(&target.name),
                    target.kind.to_string(),
                    colors::file_path(&target.url),
                    colors::dim(&format!("timeout {}ms", target.timeout_ms))
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&targets)?);
        }
    }

    Ok(())
}
