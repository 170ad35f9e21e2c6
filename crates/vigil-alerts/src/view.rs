//! View-model mapping for the surrounding page chrome.
//!
//! This is the only presentation-specific surface of the core: a pure read
//! of store, feed, and connection state into render fields. No business
//! rules live here; consolidation and minimization are decided by the store.

use chrono::{DateTime, Utc};

use vigil_core::types::{ConnectionState, Severity};

use crate::store::AlertSnapshot;

/// One renderable alert card.
#[derive(Debug, Clone)]
pub struct AlertCard {
    /// Store id, used for dismissal
    pub id: u64,
    /// Severity (drives render theme)
    pub severity: Severity,
    /// Severity icon
    pub icon: &'static str,
    /// Message payload
    pub message: String,
    /// Ingestion timestamp for display
    pub received_at: DateTime<Utc>,
    /// True while the exit transition is running
    pub dismissing: bool,
}

/// Consolidated-banner view, shown instead of individual cards when the
/// concurrent alert count exceeds the display threshold.
#[derive(Debug, Clone)]
pub struct BannerView {
    /// Total concurrent alerts represented by the banner
    pub total: usize,
    /// Severity of the highest-priority alert
    pub severity: Severity,
    /// Icon of the highest-priority alert
    pub icon: &'static str,
    /// Message of the highest-priority alert
    pub message: String,
}

impl BannerView {
    /// Format for a single-line banner.
    pub fn format_line(&self) -> String {
        format!(
            "{} {} (+{} more alerts)",
            self.icon,
            self.message,
            self.total.saturating_sub(1)
        )
    }
}

/// Render-ready state for the notification chrome.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// "Live" or "Offline"
    pub connection_label: &'static str,
    /// True when the push channel is connected
    pub live: bool,
    /// Unread durable-notification count for the badge
    pub unread_count: usize,
    /// Whether the alert view is minimized
    pub minimized: bool,
    /// Individual cards, newest first; empty when the banner is shown
    pub cards: Vec<AlertCard>,
    /// Consolidated banner, present past the threshold
    pub banner: Option<BannerView>,
}

impl DashboardView {
    /// Build the view from a store snapshot, the unread count, and the
    /// current connection state.
    pub fn build(snapshot: &AlertSnapshot, unread_count: usize, state: ConnectionState) -> Self {
        let banner = snapshot.consolidated.as_ref().map(|c| BannerView {
            total: c.total,
            severity: c.top.severity,
            icon: c.top.severity.icon(),
            message: c.top.message.clone(),
        });

        let cards = if banner.is_some() {
            Vec::new()
        } else {
            snapshot
                .alerts
                .iter()
                .map(|a| AlertCard {
                    id: a.id,
                    severity: a.severity,
                    icon: a.severity.icon(),
                    message: a.message.clone(),
                    received_at: a.received_at,
                    dismissing: a.dismissing,
                })
                .collect()
        };

        Self {
            connection_label: state.label(),
            live: state.is_connected(),
            unread_count,
            minimized: snapshot.minimized,
            cards,
            banner,
        }
    }

    /// Format the unread badge, empty when there is nothing unread.
    pub fn format_badge(&self) -> String {
        if self.unread_count > 0 {
            format!("🔔 {}", self.unread_count)
        } else {
            String::new()
        }
    }

    /// Format a compact one-line status for the header.
    pub fn format_status_line(&self) -> String {
        let alerts = match &self.banner {
            Some(banner) => banner.format_line(),
            None if self.cards.is_empty() => "no active alerts".to_string(),
            None => format!("{} active alert(s)", self.cards.len()),
        };
        format!(
            "[{}] {} | unread: {}{}",
            self.connection_label,
            alerts,
            self.unread_count,
            if self.minimized { " | minimized" } else { "" }
        )
    }
}
