//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::AppResult;

/// Whether the parsed command ends in a running server.
///
/// `serve` without `--dry-run` and the bare invocation both start it.
pub fn should_start_server(cli: &Cli) -> bool {
    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => !dry_run,
        Some(Commands::Check) => false,
        None => true,
    }
}

/// Execute a CLI command with the given settings
///
/// Commands that start the server return `Ok(())` immediately; startup is
/// handled by the binary.
///
/// # Arguments
/// * `cli` - Parsed CLI arguments
/// * `settings` - Merged and validated settings
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).execute(true).await
        }
        Some(Commands::Serve { .. }) | None => Ok(()),
        Some(Commands::Check) => CheckCommandHandler::new(settings).execute().await,
    }
}
