use crate::error::{Result, TaskflowError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level settings, read from `config.toml` in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskflowConfig {
    pub storage: StorageConfig,
    pub session: RefreshConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File name of the board blob inside the data directory
    pub board_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            board_file: "board.json".to_string(),
        }
    }
}

/// Timing for the session refresh scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// How often the session expiry is checked
    pub check_interval_ms: u64,
    /// Refresh once the token has this little time left
    pub refresh_threshold_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 5_000,
            refresh_threshold_ms: 5_000,
        }
    }
}

impl RefreshConfig {
    // One day; keeps the chrono conversion in range
    const MAX_MS: u64 = 86_400_000;

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn refresh_threshold(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.refresh_threshold_ms.min(Self::MAX_MS) as i64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval_ms == 0 {
            return Err(TaskflowError::ConfigError(
                "session.check_interval_ms must be greater than zero".into(),
            ));
        }
        if self.check_interval_ms > Self::MAX_MS || self.refresh_threshold_ms > Self::MAX_MS {
            return Err(TaskflowError::ConfigError(format!(
                "session timings must not exceed {} ms",
                Self::MAX_MS
            )));
        }
        Ok(())
    }
}

impl TaskflowConfig {
    /// Loads settings from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| TaskflowError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.board_file.trim().is_empty() {
            return Err(TaskflowError::ConfigError(
                "storage.board_file must not be empty".into(),
            ));
        }
        self.session.validate()
    }
}
