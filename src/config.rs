// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::projector::{DEFAULT_BILL_DESCRIPTION, DEFAULT_BILL_TIME, EVERYDAY_CAP, RECURRING_CAP};
use crate::storage::LocalStorage;
use crate::sync::DEFAULT_HORIZON_MONTHS;
use anyhow::{Error, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

fn default_true() -> bool {
    true
}
fn default_horizon_months() -> u32 {
    DEFAULT_HORIZON_MONTHS
}
fn default_everyday_cap() -> usize {
    EVERYDAY_CAP
}
fn default_recurring_cap() -> usize {
    RECURRING_CAP
}
fn default_bill_time() -> String {
    DEFAULT_BILL_TIME.to_string()
}
fn default_bill_description() -> String {
    DEFAULT_BILL_DESCRIPTION.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// How far ahead a resync materializes events.
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    #[serde(default = "default_everyday_cap")]
    pub everyday_cap: usize,
    #[serde(default = "default_recurring_cap")]
    pub recurring_cap: usize,

    #[serde(default = "default_bill_time")]
    pub bill_time: String, // Format "HH:MM"
    #[serde(default = "default_bill_description")]
    pub bill_description: String,
    #[serde(default = "default_true")]
    pub sync_bills: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            everyday_cap: EVERYDAY_CAP,
            recurring_cap: RECURRING_CAP,
            bill_time: DEFAULT_BILL_TIME.to_string(),
            bill_description: DEFAULT_BILL_DESCRIPTION.to_string(),
            sync_bills: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Loads the config, falling back to defaults only when the file is missing.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Whether an error from [`Config::load`] means the file does not exist.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Configured log level; unrecognized names fall back to `Info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}
