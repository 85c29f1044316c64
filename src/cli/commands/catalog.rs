//! Catalog commands - list, info, create, close, erase indices

use crate::cli::output::{colors, emit, format_bytes, format_relative_time};
use crate::cli::OutputFormat;
use crate::core::catalog::read_members;
use crate::core::engine::{IndexDocument, TantivyIndex};
use crate::core::services::Services;
use crate::core::types::HandleInfo;
use clap::Args;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for list
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show indices with a live handle
    #[arg(long)]
    pub live: bool,
}

/// Arguments for info
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Index name
    pub name: String,
}

/// Arguments for create
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Index name
    pub name: String,

    /// Make a composite index reading through these indices
    #[arg(long, value_delimiter = ',', conflicts_with = "documents")]
    pub members: Vec<String>,

    /// Load one document per non-empty line of this file
    #[arg(long)]
    pub documents: Option<PathBuf>,
}

/// Arguments for close
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Index name
    pub name: String,
}

/// Arguments for erase
#[derive(Args, Debug)]
pub struct EraseArgs {
    /// Index name
    pub name: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// One row of the listing
#[derive(Debug, Serialize)]
pub struct IndexListItem {
    pub name: String,
    pub open: bool,
    pub locked: bool,
    pub members: Vec<String>,
}

/// List response
#[derive(Debug, Serialize)]
pub struct IndexListResponse {
    pub count: usize,
    pub indices: Vec<IndexListItem>,
}

/// Create response
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub name: String,
    pub dir: PathBuf,
    pub members: Vec<String>,
    pub documents: usize,
}

/// Execute list command
pub async fn execute_list(
    args: ListArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = &services.registry;
    let names = if args.live {
        registry.live_names()
    } else {
        registry.list()?
    };

    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let members = read_members(&registry.layout().index_dir(&name)?)?;
        indices.push(IndexListItem {
            open: registry.peek(&name).is_some(),
            locked: registry.is_locked(&name),
            members,
            name,
        });
    }
    let response = IndexListResponse {
        count: indices.len(),
        indices,
    };

    emit(&response, format, |response| {
        if response.indices.is_empty() {
            println!(
                "No indices found. Run '{}' to make one.",
                colors::label("reshelve create <name>")
            );
            return;
        }
        println!(
            "{} ({}):",
            colors::label("Indices"),
            colors::number(&response.count.to_string())
        );
        for item in &response.indices {
            let mut notes = Vec::new();
            if item.open {
                notes.push("open".to_string());
            }
            if item.locked {
                notes.push("swapping".to_string());
            }
            if !item.members.is_empty() {
                notes.push(format!("composite: {}", item.members.join(", ")));
            }
            println!(
                "  {:<24} {}",
                colors::index_name(&item.name),
                colors::dim(&notes.join(", "))
            );
        }
    })
}

/// Execute info command
pub async fn execute_info(
    args: InfoArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let info: HandleInfo = services.registry.info(&args.name).map_err(|e| {
        if e.is_not_found() {
            format!(
                "Index '{}' not found. Run 'reshelve list' to see available indices.",
                args.name
            )
        } else {
            e.to_string()
        }
    })?;

    match format {
        OutputFormat::Human => {
            println!(
                "{}: {}",
                colors::label("Index"),
                colors::index_name(&info.name)
            );
            println!(
                "  {}: {}",
                colors::label("Directory"),
                colors::file_path(&info.dir.to_string_lossy())
            );
            if !info.members.is_empty() {
                println!(
                    "  {}: {}",
                    colors::label("Members"),
                    info.members.join(", ")
                );
            }
            println!(
                "  {}: {}",
                colors::label("Documents"),
                colors::number(&info.statistics.num_docs.to_string())
            );
            println!(
                "  {}: {}",
                colors::label("Segments"),
                colors::number(&info.statistics.num_segments.to_string())
            );
            println!(
                "  {}: {}",
                colors::label("Size"),
                colors::number(&format_bytes(info.statistics.size_bytes))
            );
            println!(
                "  {}: {}",
                colors::label("Replicated"),
                if info.true_replicate { "yes" } else { "no" }
            );
            println!(
                "  {}: {}",
                colors::label("Opened"),
                colors::dim(&format_relative_time(&info.opened_at))
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

/// Read one document per non-empty line
fn load_documents(name: &str, path: &Path) -> io::Result<Vec<IndexDocument>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| IndexDocument::new(format!("{name}-{i}"), line))
        .collect())
}

/// Execute create command
pub async fn execute_create(
    args: CreateArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = &services.registry;

    let documents = match &args.documents {
        Some(path) => load_documents(&args.name, path)
            .map_err(|e| format!("Cannot read documents from {}: {e}", path.display()))?,
        None => Vec::new(),
    };

    let dir = if args.members.is_empty() {
        registry.create(&args.name)?
    } else {
        registry.create_composite(&args.name, &args.members)?
    };

    if !documents.is_empty() {
        TantivyIndex::open_or_create(&dir)?
            .write_documents(&documents, services.config.catalog.writer_heap_bytes)?;
    }

    let response = CreateResponse {
        name: args.name,
        dir,
        members: args.members,
        documents: documents.len(),
    };

    emit(&response, format, |response| {
        println!(
            "{} index '{}' at {}",
            colors::success("Created"),
            colors::index_name(&response.name),
            colors::file_path(&response.dir.to_string_lossy())
        );
        if !response.members.is_empty() {
            println!("  reads through: {}", response.members.join(", "));
        }
        if response.documents > 0 {
            println!(
                "  loaded {} documents",
                colors::number(&response.documents.to_string())
            );
        }
    })
}

/// Execute close command
pub async fn execute_close(
    args: CloseArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let was_open = services.registry.peek(&args.name).is_some();
    services.registry.close(&args.name)?;

    match format {
        OutputFormat::Human => {
            if was_open {
                println!(
                    "{} index '{}'",
                    colors::success("Closed"),
                    colors::index_name(&args.name)
                );
            } else {
                println!(
                    "Index '{}' was not open",
                    colors::index_name(&args.name)
                );
            }
        }
        OutputFormat::Json => {
            let response = serde_json::json!({
                "closed": was_open,
                "name": args.name
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Execute erase command
pub async fn execute_erase(
    args: EraseArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = services.registry.layout().index_dir(&args.name)?;
    if !dir.exists() {
        return Err(format!(
            "Index '{}' not found. Run 'reshelve list' to see available indices.",
            args.name
        )
        .into());
    }

    // Confirmation prompt unless --force
    if !args.force {
        print!("Erase index '{}'? [y/N] ", colors::index_name(&args.name));
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", colors::dim("Cancelled."));
            return Ok(());
        }
    }

    services.registry.erase(&args.name)?;

    match format {
        OutputFormat::Human => {
            println!(
                "{} index '{}'",
                colors::success("Erased"),
                colors::index_name(&args.name)
            );
        }
        OutputFormat::Json => {
            let response = serde_json::json!({
                "erased": true,
                "name": args.name
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
