//! Application context for the Reload CLI.
//!
//! Combines CLI arguments with the config file and opens the store.

use std::path::{Path, PathBuf};

use reload_core::{Ledger, Policy, SqliteStore};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, ReloadConfig};

pub struct AppContext<'a> {
    cli: &'a Cli,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn json(&self) -> bool {
        self.cli.json
    }

    /// Config file contents, if one exists.
    pub fn config(&self) -> anyhow::Result<Option<ReloadConfig>> {
        let path = resolve_config_path()?;
        if !path.exists() {
            return Ok(None);
        }
        read_config(&path).map(Some)
    }

    /// Store path from `--store`/`RELOAD_STORE`, else from the config file.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.store.as_ref() {
            return Ok(PathBuf::from(path));
        }
        let config_path = resolve_config_path()?;
        match self.config()? {
            Some(config) => Ok(PathBuf::from(config.store.path)),
            None => Err(anyhow::anyhow!(missing_config_message(&config_path))),
        }
    }

    /// Open the store and build a ledger for the configured owner.
    pub fn open_ledger(&self) -> anyhow::Result<Ledger<SqliteStore>> {
        let path = self.store_path()?;
        if !path.exists() {
            return Err(anyhow::anyhow!(missing_store_message(&path)));
        }
        let (owner, policy) = match self.config()? {
            Some(config) => (config.account.owner.clone(), config.ledger_policy()),
            None => ("local".to_string(), Policy::default()),
        };
        let store = SqliteStore::open(&path)?;
        tracing::debug!(path = %path.display(), %owner, "store opened");
        Ok(Ledger::new(store, owner, policy))
    }
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("RELOAD_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

pub fn missing_store_message(path: &Path) -> String {
    format!(
        "No store found at {}\n\nRun:\n  reload init\n\nOr specify a store path:\n  RELOAD_STORE=/path/to/reload.db reload init",
        path.display()
    )
}

pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No config found at {}\n\nRun:\n  reload init\n\nOr specify a store path:\n  reload --store /path/to/reload.db <command>",
        config_path.display()
    )
}
