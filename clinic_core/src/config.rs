//! Configuration file support for ClinicTime.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/clinictime/config.toml`.

use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub scheduling: SchedulingConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Where the session key-value file lives inside the data directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_file")]
    pub file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file_name: default_session_file(),
        }
    }
}

/// Booking slot configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Slots offered once a date is picked, as `HH:MM`
    #[serde(default = "default_time_slots")]
    pub time_slots: Vec<String>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            time_slots: default_time_slots(),
        }
    }
}

/// Interaction tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UiConfig {
    /// Artificial pause before login and service creation complete. 0 disables it.
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: default_simulated_latency_ms(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("clinictime")
}

fn default_session_file() -> String {
    "session.json".into()
}

fn default_time_slots() -> Vec<String> {
    [
        "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30",
        "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_simulated_latency_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject slot lists the booking wizard could not offer
    pub fn validate(&self) -> Result<()> {
        if self.scheduling.time_slots.is_empty() {
            return Err(Error::Config("scheduling.time_slots must not be empty".into()));
        }
        for slot in &self.scheduling.time_slots {
            NaiveTime::parse_from_str(slot, "%H:%M").map_err(|e| {
                Error::Config(format!("Invalid time slot {:?}: {}", slot, e))
            })?;
        }
        if self.session.file_name.trim().is_empty() {
            return Err(Error::Config("session.file_name must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("clinictime").join("config.toml")
    }

    /// Session file path under the given data directory
    pub fn session_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.session.file_name)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.ui.simulated_latency_ms)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduling.time_slots.len(), 16);
        assert_eq!(config.scheduling.time_slots[0], "08:00");
        assert_eq!(config.scheduling.time_slots[15], "17:30");
        assert_eq!(config.ui.simulated_latency_ms, 1000);
        assert_eq!(config.session.file_name, "session.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[ui]
simulated_latency_ms = 0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ui.simulated_latency_ms, 0);
        assert_eq!(config.simulated_latency(), Duration::ZERO);
        assert_eq!(config.scheduling.time_slots.len(), 16); // default
    }

    #[test]
    fn test_save_and_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.scheduling.time_slots = vec!["07:00".into(), "07:45".into()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scheduling.time_slots, vec!["07:00", "07:45"]);
    }

    #[test]
    fn test_invalid_slot_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[scheduling]\ntime_slots = [\"8h\"]\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_session_path_joins_data_dir() {
        let config = Config::default();
        let path = config.session_path(Path::new("/tmp/clinic"));
        assert_eq!(path, PathBuf::from("/tmp/clinic/session.json"));
    }
}
