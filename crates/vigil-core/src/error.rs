//! Error types for Vigil operations.
//!
//! This module defines [`VigilError`], the error enum shared by the Vigil
//! crates. Errors are designed for visibility: nothing in the notification
//! core panics across a component boundary, and anything the core swallows
//! (malformed frames, audio failures) is logged before being dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`VigilError`].
pub type Result<T> = std::result::Result<T, VigilError>;

/// Error type for Vigil operations.
#[derive(Debug, Error)]
pub enum VigilError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in Vigil)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl VigilError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create an I/O error
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.vigil/config.yaml or pass --config with a valid path")
            }
            Self::ConfigInvalid { .. } => Some("Check YAML syntax in the configuration file"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_error() {
        let err = VigilError::config_not_found("/home/user/.vigil/config.yaml");
        assert!(err.to_string().contains("Configuration not found"));
        assert!(err.is_config_error());
        assert!(err.guidance().is_some());
    }

    #[test]
    fn test_guidance_per_config_variant() {
        let not_found = VigilError::config_not_found("/tmp/missing.yaml");
        assert!(not_found.guidance().unwrap().contains("--config"));

        let invalid = VigilError::ConfigInvalid {
            path: PathBuf::from("/tmp/config.yaml"),
            message: "bad indent".into(),
        };
        assert!(invalid.guidance().unwrap().contains("YAML"));

        let internal = VigilError::internal("bug");
        assert!(internal.guidance().is_none());
        assert!(!internal.is_config_error());
    }
}
