//! CLI command implementations
//!
//! Each command module handles argument parsing and execution for a specific CLI command.

pub mod catalog;
pub mod completions;
pub mod config;
pub mod push;
pub mod recover;
pub mod targets;

// Re-export argument types for use in mod.rs
pub use completions::CompletionsArgs;
pub use config::ConfigArgs;
pub use push::PushArgs;
pub use recover::RecoverArgs;
pub use targets::TargetsArgs;
