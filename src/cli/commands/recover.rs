//! Recover command - inspect and repair interrupted receive sessions

use crate::cli::output::{colors, format_bytes};
use crate::cli::OutputFormat;
use crate::core::replication::{RecoveryReport, RepairAction};
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the recover command
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// Restore or discard the leftovers that were found
    #[arg(long)]
    pub repair: bool,

    /// Only look at this index
    pub name: Option<String>,
}

/// One repaired index
#[derive(Debug, Serialize)]
pub struct RepairOutcome {
    pub name: String,
    pub action: Option<RepairAction>,
    pub error: Option<String>,
}

/// Recover response
#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub leftovers: Vec<RecoveryReport>,
    pub repairs: Vec<RepairOutcome>,
}

/// Execute the recover command
pub async fn execute(
    args: RecoverArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut leftovers = services.recovery.scan()?;
    if let Some(name) = &args.name {
        leftovers.retain(|r| &r.name == name);
    }

    let mut repairs = Vec::new();
    if args.repair {
        for report in &leftovers {
            let outcome = match services.recovery.repair(&report.name) {
                Ok(action) => RepairOutcome {
                    name: report.name.clone(),
                    action: Some(action),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Repair of '{}' failed: {}", report.name, e);
                    RepairOutcome {
                        name: report.name.clone(),
                        action: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            repairs.push(outcome);
        }
    }

    let response = RecoverResponse { leftovers, repairs };

    match format {
        OutputFormat::Human => {
            if response.leftovers.is_empty() {
                println!("{}", colors::success("No leftovers found."));
                return Ok(());
            }
            println!("{}:", colors::label("Leftovers"));
            for report in &response.leftovers {
                let mut parts = Vec::new();
                if report.staging {
                    parts.push(format!("staging {}", format_bytes(report.staging_bytes)));
                }
                if report.trash {
                    parts.push(format!("trash {}", format_bytes(report.trash_bytes)));
                }
                if report.merge_work {
                    parts.push("merge work dir".to_string());
                }
                if !report.live_present {
                    parts.push(colors::warning("live content missing").to_string());
                }
                println!(
                    "  {:<24} {}",
                    colors::index_name(&report.name),
                    parts.join(", ")
                );
            }

            if !args.repair {
                println!(
                    "Run '{}' to clean up.",
                    colors::label("reshelve recover --repair")
                );
            }
            for outcome in &response.repairs {
                match (&outcome.action, &outcome.error) {
                    (Some(action), _) => println!(
                        "  {} {}: {:?}",
                        colors::success("Repaired"),
                        colors::index_name(&outcome.name),
                        action
                    ),
                    (None, Some(error)) => println!(
                        "  {} {}: {}",
                        colors::error("Failed"),
                        colors::index_name(&outcome.name),
                        error
                    ),
                    (None, None) => {}
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
