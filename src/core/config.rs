//! Configuration for the memory cleaner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::phase::SettleDelays;
use crate::platform::codes::ReductMask;
use crate::platform::{HeapOptions, VolumeCacheOptions};
use crate::security::validator::{validate_config_value, validate_path};

/// Hard cap on processes touched by the managed-process phase.
pub const MAX_MANAGED_PROCESSES: usize = 20;

/// Longest auto-clean check interval (one day)
pub const MAX_INTERVAL_MINUTES: u64 = 1440;

/// Errors loading, saving or validating the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Serialize(String),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Serialize error: {}", msg),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {}: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

/// Main cleaner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Capability classes to run (bits of the reduction mask)
    pub mask: ReductMask,

    /// Processes hosting a managed runtime trimmed per run
    pub managed_process_limit: usize,

    /// Pause after each phase
    pub delays: SettleDelays,

    /// Temp sweep and recycle bin
    pub volume_cache: VolumeCacheOptions,

    /// Own-process heap compaction
    pub heap: HeapOptions,

    /// Threshold-driven background cleaning
    pub auto_clean: AutoCleanSettings,
}

/// Settings of the auto-clean watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCleanSettings {
    pub enabled: bool,
    /// RAM usage that triggers a cleanup (1-99)
    pub threshold_percent: u32,
    /// Minutes between checks (1-1440)
    pub interval_minutes: u64,
}

impl Default for AutoCleanSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_percent: 75,
            interval_minutes: 30,
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            mask: ReductMask::DEFAULT,
            managed_process_limit: MAX_MANAGED_PROCESSES,
            delays: SettleDelays::default(),
            volume_cache: VolumeCacheOptions::default(),
            heap: HeapOptions::default(),
            auto_clean: AutoCleanSettings::default(),
        }
    }
}

impl CleanerConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memcleaner")
            .join("config.toml")
    }

    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every bounded value
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, String); 7] = [
            ("mask", self.mask.bits().to_string()),
            ("threshold_percent", self.auto_clean.threshold_percent.to_string()),
            ("interval_minutes", self.auto_clean.interval_minutes.to_string()),
            ("max_files_per_dir", self.volume_cache.max_files_per_dir.to_string()),
            ("max_age_hours", self.volume_cache.max_age_hours.to_string()),
            ("passes", self.heap.passes.to_string()),
            ("managed_process_limit", self.managed_process_limit.to_string()),
        ];
        for (key, value) in checks {
            if !validate_config_value(key, &value) {
                return Err(ConfigError::Invalid { key, value });
            }
        }

        for dir in &self.volume_cache.extra_dirs {
            if !validate_path(dir) {
                return Err(ConfigError::Invalid {
                    key: "extra_dirs",
                    value: dir.display().to_string(),
                });
            }
        }
        Ok(())
    }
}
