//! Shared type definitions for the Vigil notification core.
//!
//! The push service is loose about payload shape: `type` may be absent and
//! new fields appear without notice. [`PushFrame`] therefore keeps the known
//! fields typed and passes everything else through opaquely, with severity
//! defaulted at the ingestion boundary.

use serde::{Deserialize, Serialize};

/// Alert severity level.
///
/// Ordering follows priority: `Critical > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational (general announcements)
    Info = 0,
    /// Warning (active-monitoring events)
    Warning = 1,
    /// Critical (must never be silently hidden)
    Critical = 2,
}

impl Severity {
    /// Get the icon for this severity level.
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
            Severity::Critical => "✖",
        }
    }

    /// Get the display label for this severity level.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity from the wire `type` field, if recognizable.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(Severity::Critical),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// Named push channels the notification service publishes on.
pub mod channels {
    /// Critical alert stream (deaths, urgent intake)
    pub const CRITICAL: &str = "critical";
    /// Active-monitoring stream (cold room, occupancy)
    pub const ACTIVE_MONITORING: &str = "active-monitoring";
    /// General announcement stream
    pub const GENERAL: &str = "general";
}

/// Map a channel name to the default severity used when a frame omits `type`.
///
/// Unknown channels are treated as general announcements.
pub fn channel_default_severity(channel: &str) -> Severity {
    match channel {
        channels::CRITICAL => Severity::Critical,
        channels::ACTIVE_MONITORING => Severity::Warning,
        _ => Severity::Info,
    }
}

/// State of the single push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection; reconnect pending or never started
    #[default]
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Live connection established
    Connected,
}

impl ConnectionState {
    /// Get the indicator label shown in the page chrome.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Live",
            ConnectionState::Connecting | ConnectionState::Disconnected => "Offline",
        }
    }

    /// Returns true if the connection is currently live.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A single frame received on the push channel.
///
/// Only `message` is required. Unknown fields are kept in `extra` so new
/// server fields pass through without a schema change here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFrame {
    /// Channel the frame arrived on (absent on some legacy frames)
    #[serde(default)]
    pub channel: Option<String>,

    /// Human-readable payload
    pub message: String,

    /// Explicit severity, when the server supplies one
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Optional reference to a deceased record
    #[serde(rename = "deceasedId", default)]
    pub deceased_id: Option<String>,

    /// Opaque pass-through for any other server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PushFrame {
    /// Create a frame with just a message, for tests and local events.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            channel: None,
            message: message.into(),
            kind: None,
            deceased_id: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the `type` field.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the channel name.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Resolve this frame's severity, falling back to the given default
    /// when `type` is absent or unrecognized.
    pub fn severity_or(&self, default: Severity) -> Severity {
        self.kind
            .as_deref()
            .and_then(Severity::from_wire)
            .unwrap_or(default)
    }
}
