use std::path::{Path, PathBuf};

use reload_core::quota::{QuotaTable, Tier};
use reload_core::{Policy, ShortagePolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub account: AccountSection,
    #[serde(default)]
    pub policy: PolicySection,

    /// Ceiling overrides; built-in tier limits apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaTable>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountSection {
    pub owner: String,
    #[serde(default)]
    pub tier: Tier,
}

impl Default for AccountSection {
    fn default() -> Self {
        Self {
            owner: "local".to_string(),
            tier: Tier::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct PolicySection {
    #[serde(default)]
    pub shortage: ShortagePolicy,
}

impl ReloadConfig {
    pub fn new(store_path: PathBuf, owner: String, tier: Tier, shortage: ShortagePolicy) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            account: AccountSection { owner, tier },
            policy: PolicySection { shortage },
            quota: None,
        }
    }

    pub fn ledger_policy(&self) -> Policy {
        Policy {
            tier: self.account.tier,
            quotas: self.quota.unwrap_or_default(),
            shortage: self.policy.shortage,
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("reload.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<ReloadConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &ReloadConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("reload"));
        }
    }
    Ok(home_dir()?.join(".config").join("reload"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("reload"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("reload"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ReloadConfig = toml::from_str("[store]\npath = \"/tmp/r.db\"\n").unwrap();
        let policy = config.ledger_policy();
        assert_eq!(config.account.owner, "local");
        assert_eq!(policy.tier, Tier::Free);
        assert_eq!(policy.shortage, ShortagePolicy::Clamp);
        assert_eq!(policy.quotas, QuotaTable::default());
    }

    #[test]
    fn test_quota_override_keeps_other_ceilings() {
        let config: ReloadConfig = toml::from_str(
            "[store]\npath = \"/tmp/r.db\"\n\n[policy]\nshortage = \"reject\"\n\n[quota.free]\nfirearms = 10\n",
        )
        .unwrap();
        let quotas = config.ledger_policy().quotas;
        assert_eq!(quotas.free.firearms, Some(10));
        assert_eq!(quotas.free.sessions, Some(100));
        assert_eq!(quotas.pro.firearms, None);
        assert_eq!(config.policy.shortage, ShortagePolicy::Reject);
    }

    #[test]
    fn test_written_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reload").join("config.toml");
        let config = ReloadConfig::new(
            dir.path().join("reload.db"),
            "alex".to_string(),
            Tier::Pro,
            ShortagePolicy::Reject,
        );
        write_config(&path, &config).unwrap();

        let read = read_config(&path).unwrap();
        assert_eq!(read.account.owner, "alex");
        assert_eq!(read.account.tier, Tier::Pro);
        assert!(read.quota.is_none());
    }
}
