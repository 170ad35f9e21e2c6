//! Configuration for the Vigil notification console.
//!
//! Configuration lives at `~/.vigil/config.yaml`. Every field has a default,
//! so a missing file at the default location is not an error; an explicitly
//! passed path that does not exist is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Top-level Vigil configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Push channel connection settings
    pub push: PushConfig,

    /// Notification REST API settings
    pub api: ApiConfig,

    /// Alert store timing and consolidation settings
    pub alerts: AlertConfig,

    /// Sound cue settings
    pub sound: SoundConfig,
}

/// Push channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// WebSocket endpoint of the notification service
    pub url: String,

    /// Fixed delay between reconnect attempts, in seconds
    pub reconnect_delay_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/notifications/stream".to_string(),
            reconnect_delay_secs: 5,
        }
    }
}

/// Notification REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the notification REST API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Alert store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// How long an alert stays visible absent explicit dismissal, in seconds
    pub ttl_secs: u64,

    /// Exit-animation window between dismissal and removal, in milliseconds
    pub exit_window_ms: u64,

    /// Above this many concurrent alerts, a consolidated banner is shown
    pub consolidation_threshold: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 10,
            exit_window_ms: 300,
            consolidation_threshold: 5,
        }
    }
}

/// Sound cue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Whether the tone cue is enabled at all
    pub enabled: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl VigilConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist and parse. With `None`, the
    /// default path is used if present, otherwise defaults are returned.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(VigilError::config_not_found(path));
                }
                Self::from_file(&path)
            }
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VigilError::io("reading config", path, e))?;

        serde_yaml::from_str(&content).map_err(|e| VigilError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path (`~/.vigil/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| VigilError::Internal {
            message: "Could not determine home directory".into(),
        })?;
        Ok(home.join(".vigil").join("config.yaml"))
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.push.url.is_empty() {
            return Err(VigilError::ConfigValidation {
                message: "push.url must not be empty".into(),
            });
        }
        if self.api.base_url.is_empty() {
            return Err(VigilError::ConfigValidation {
                message: "api.base_url must not be empty".into(),
            });
        }
        if self.alerts.consolidation_threshold == 0 {
            return Err(VigilError::ConfigValidation {
                message: "alerts.consolidation_threshold must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VigilConfig::default();
        assert_eq!(config.push.reconnect_delay_secs, 5);
        assert_eq!(config.alerts.ttl_secs, 10);
        assert_eq!(config.alerts.exit_window_ms, 300);
        assert_eq!(config.alerts.consolidation_threshold, 5);
        assert!(config.sound.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "push:\n  url: wss://mortuary.example/stream\nalerts:\n  ttl_secs: 20\n",
        )
        .unwrap();

        let config = VigilConfig::from_file(&path).unwrap();
        assert_eq!(config.push.url, "wss://mortuary.example/stream");
        assert_eq!(config.alerts.ttl_secs, 20);
        // Untouched sections keep defaults
        assert_eq!(config.push.reconnect_delay_secs, 5);
        assert_eq!(config.alerts.exit_window_ms, 300);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "push: [not a mapping").unwrap();

        let err = VigilConfig::from_file(&path).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let err = VigilConfig::load(Some(PathBuf::from("/nonexistent/vigil.yaml"))).unwrap_err();
        assert!(matches!(err, VigilError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let mut config = VigilConfig::default();
        config.push.url = String::new();
        assert!(config.validate().is_err());
    }
}
