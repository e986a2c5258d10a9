//! Reload CLI - inventory ledger for ammunition reloading
//!
//! This is the command-line interface for Reload. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;

use clap::Parser;
use reload_core::ReloadError;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::batch::handle_batch;
use crate::commands::check::handle_check;
use crate::commands::component::handle_component;
use crate::commands::firearm::handle_firearm;
use crate::commands::init::handle_init;
use crate::commands::maintenance::handle_maintenance;
use crate::commands::misc::{handle_backup, handle_completions};
use crate::commands::session::handle_session;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

/// Log to stderr, filtered by `RELOAD_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RELOAD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Commands::Init(args) => handle_init(&ctx, args),
        Commands::Component(command) => handle_component(&ctx, command),
        Commands::Firearm(command) => handle_firearm(&ctx, command),
        Commands::Batch(command) => handle_batch(&ctx, command),
        Commands::Session(command) => handle_session(&ctx, command),
        Commands::Maintenance(command) => handle_maintenance(&ctx, command),
        Commands::Check => handle_check(&ctx),
        Commands::Backup(args) => handle_backup(&ctx, args),
        Commands::Completions { shell } => handle_completions(*shell),
    }
}

/// 3 for a missing record, 4 for a refused action, 5 for an unreconciled partial failure.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ReloadError>() {
        Some(ReloadError::NotFound(_)) => 3,
        Some(
            ReloadError::QuotaExceeded { .. }
            | ReloadError::InsufficientStock { .. }
            | ReloadError::InsufficientRounds { .. },
        ) => 4,
        Some(ReloadError::PartialFailure { .. }) => 5,
        _ => 1,
    }
}
