use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MoneyboxError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: String,
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
    /// Shared folder used as the sync backend. `None` runs local-only.
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default = "default_push_batch_limit")]
    pub push_batch_limit: usize,
    #[serde(default = "default_tombstone_retention_days")]
    pub tombstone_retention_days: i64,
}

fn default_owner_id() -> String {
    "local".to_string()
}

fn default_push_batch_limit() -> usize {
    500
}

fn default_tombstone_retention_days() -> i64 {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            owner_id: default_owner_id(),
            remote: None,
            push_batch_limit: default_push_batch_limit(),
            tombstone_retention_days: default_tombstone_retention_days(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("moneybox")
}

fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("moneybox")
}

pub fn load_config() -> Config {
    let path = config_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring unreadable config at {}: {e}", path.display());
                Config::default()
            }
        }
    } else {
        Config::default()
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| MoneyboxError::Config(e.to_string()))?;
    std::fs::write(config_path(), format!("{json}\n"))?;
    Ok(())
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("moneybox.db")
    }

    pub fn retention_cutoff(&self, now: i64) -> i64 {
        now - self.tombstone_retention_days.max(0) * 24 * 60 * 60 * 1000
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
