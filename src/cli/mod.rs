//! CLI adapter for reshelve
//!
//! Operates the catalog and drives local pushes from the command line.
//! Depends on `core/`; nothing in `core/` depends on it.
//!
//! # Architecture
//!
//! ```text
//!              +------------------+
//!              |     core/        |
//!              | catalog + repl.  |
//!              +--------+---------+
//!                       |
//!                       v
//!              +------------------+
//!              |      cli/        |
//!              | (clap adapter)   |
//!              +------------------+
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

/// reshelve - replicated index catalog
///
/// Manage a directory of Tantivy indices and push new versions into it
/// without taking readers offline.
#[derive(Parser, Debug)]
#[command(name = "reshelve")]
#[command(version)]
#[command(about = "Replicated index catalog", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List index directories under the data root
    List(commands::catalog::ListArgs),

    /// Show handle details and statistics for an index
    Info(commands::catalog::InfoArgs),

    /// Create an empty, composite or pre-loaded index
    Create(commands::catalog::CreateArgs),

    /// Close the live handle of an index
    Close(commands::catalog::CloseArgs),

    /// Delete an index and its staging leftovers
    Erase(commands::catalog::EraseArgs),

    /// Push a local index directory into the catalog
    Push(commands::PushArgs),

    /// Discard a partial receive session
    Abort(commands::push::AbortArgs),

    /// Report (and optionally repair) leftovers of interrupted sessions
    Recover(commands::RecoverArgs),

    /// List configured replication targets
    Targets(commands::TargetsArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  reshelve completions bash > ~/.local/share/bash-completion/completions/reshelve
    ///   zsh:   reshelve completions zsh > ~/.zfunc/_reshelve
    ///   fish:  reshelve completions fish > ~/.config/fish/completions/reshelve.fish
    Completions(commands::CompletionsArgs),
}

/// Install the stderr tracing subscriber; later calls are no-ops
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "reshelve=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use crate::core::xdg::XdgDirs;
    use std::sync::Arc;

    // Handle completions command early (doesn't need services)
    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    init_tracing(cli.log_format);

    let xdg = XdgDirs::new();
    xdg.log_paths();
    xdg.ensure_dirs_exist()?;

    let config = Config::load_with_xdg(&xdg)?;
    config.log_config();

    let services = Arc::new(Services::new(config)?);

    match cli.command {
        Commands::List(args) => commands::catalog::execute_list(args, &services, cli.format).await,
        Commands::Info(args) => commands::catalog::execute_info(args, &services, cli.format).await,
        Commands::Create(args) => {
            commands::catalog::execute_create(args, &services, cli.format).await
        }
        Commands::Close(args) => {
            commands::catalog::execute_close(args, &services, cli.format).await
        }
        Commands::Erase(args) => {
            commands::catalog::execute_erase(args, &services, cli.format).await
        }
        Commands::Push(args) => commands::push::execute(args, &services, cli.format).await,
        Commands::Abort(args) => commands::push::execute_abort(args, &services, cli.format).await,
        Commands::Recover(args) => commands::recover::execute(args, &services, cli.format).await,
        Commands::Targets(args) => commands::targets::execute(args, &services, cli.format).await,
        Commands::ShowConfig(args) => commands::config::execute(args, &services, cli.format).await,
        Commands::Completions(_) => unreachable!(), // Handled above
    }
}
