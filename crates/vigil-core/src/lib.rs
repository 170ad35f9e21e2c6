//! # vigil-core
//!
//! Core types, errors, and utilities for the Vigil notification console.
//!
//! This crate provides:
//! - [`VigilError`] - Error types shared across Vigil crates
//! - [`logging`] - Tracing setup and log management utilities
//! - [`types`] - Severity, connection state, and push-frame definitions
//! - [`config`] - YAML-backed configuration with defaults
//!
//! ## Example
//!
//! ```no_run
//! use vigil_core::{VigilError, Result, logging};
//!
//! fn main() -> vigil_core::Result<()> {
//!     // Initialize logging
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     let config_path = std::path::Path::new("~/.vigil/config.yaml");
//!     if !config_path.exists() {
//!         return Err(VigilError::config_not_found(config_path));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use config::VigilConfig;
pub use error::{Result, VigilError};
pub use logging::{LogGuard, init_logging};
pub use types::{ConnectionState, PushFrame, Severity};
