use std::path::PathBuf;

use reload_core::quota::Tier;
use reload_core::{ShortagePolicy, SqliteStore};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_store_path, write_config, ReloadConfig};
use crate::helpers::parse_arg;
use crate::output::print_json;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let tier: Tier = parse_arg(&args.tier)?;
    let shortage: ShortagePolicy = parse_arg(&args.shortage)?;
    let owner = args.owner.trim();
    if owner.is_empty() {
        return Err(anyhow::anyhow!("Owner cannot be empty"));
    }

    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\nHint: pass --force to overwrite it.",
            config_path.display()
        ));
    }

    let store_path = match args.path.as_ref().or(ctx.cli().store.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => default_store_path()?,
    };
    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("Failed to create store directory {}: {}", parent.display(), e)
        })?;
    }

    let store = SqliteStore::open(&store_path)?;
    let metadata = store.metadata()?;
    write_config(
        &config_path,
        &ReloadConfig::new(store_path.clone(), owner.to_string(), tier, shortage),
    )?;

    if ctx.json() {
        return print_json(&serde_json::json!({
            "store": store_path,
            "config": config_path,
            "format_version": metadata.format_version,
            "created_at": metadata.created_at,
        }));
    }
    if !ctx.quiet() {
        println!("Initialized store at {}", store_path.display());
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}
