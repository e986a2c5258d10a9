use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;

use crate::app::AppContext;
use crate::cli::{BackupArgs, Cli};
use crate::output::print_json;

pub fn handle_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "reload", &mut std::io::stdout());
    Ok(())
}

pub fn handle_backup(ctx: &AppContext, args: &BackupArgs) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let destination = Path::new(&args.destination);
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create backup directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }

    ledger.store().backup_to(destination)?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "backup": destination }));
    }
    if !ctx.quiet() {
        println!("Backed up store to {}", args.destination);
    }
    Ok(())
}
