//! Durable notification feed with optimistic local mutation.
//!
//! The feed holds the canonical client-side copy of the server's
//! notification list. Reads replace local state wholesale; user mutations
//! (mark-read, delete) are applied locally first and confirmed against the
//! server in the background. A failed confirmation is logged and left alone:
//! local state stays ahead of the server until the next full fetch corrects
//! any drift. Push-delivered duplicates are prepended as fresh unread
//! records rather than merged, and resolve the same way.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use vigil_core::types::{ConnectionState, PushFrame};

use crate::client::NotificationApi;
use crate::error::Result;

/// A durable, server-backed notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Server-assigned identifier (stable key); `local-` prefixed for
    /// push-delivered records awaiting the next resync
    pub id: String,

    /// Message payload
    pub message: String,

    /// Notification category
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Optional reference to a deceased record
    #[serde(rename = "deceasedId", default)]
    pub deceased_id: Option<String>,

    /// Server-side creation time
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Read flag; one-way within a session except via full resync
    #[serde(rename = "isRead", default)]
    pub is_read: bool,
}

/// Badge-level summary of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Unread record count
    pub unread: usize,
    /// Total record count
    pub total: usize,
}

struct FeedInner {
    records: Vec<NotificationRecord>,
    unread: usize,
}

/// Canonical client-side copy of the notification list.
///
/// Cheap to clone; all clones share state. Mutating methods are synchronous:
/// the local change lands before the method returns, and the server call
/// runs in the background.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<Mutex<FeedInner>>,
    api: Arc<NotificationApi>,
}

impl NotificationFeed {
    /// Create an empty feed backed by the given API client.
    pub fn new(api: NotificationApi) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner {
                records: Vec::new(),
                unread: 0,
            })),
            api: Arc::new(api),
        }
    }

    /// Fetch the full list and replace local state wholesale.
    ///
    /// Malformed entries (missing id or message) are dropped with a warning.
    /// Records are sorted newest first. Called on mount, on manual refresh,
    /// and after each reconnect.
    pub async fn fetch_all(&self) -> Result<()> {
        let entries = self.api.fetch_notifications().await?;
        let total_received = entries.len();

        let mut records: Vec<NotificationRecord> =
            entries.into_iter().filter_map(parse_record).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let dropped = total_received - records.len();
        if dropped > 0 {
            warn!(dropped, "dropped malformed notification entries");
        }

        let unread = records.iter().filter(|r| !r.is_read).count();
        debug!(total = records.len(), unread, "notification feed replaced");

        let mut inner = self.inner.lock().unwrap();
        inner.records = records;
        inner.unread = unread;
        Ok(())
    }

    /// Mark a single record as read.
    ///
    /// The local flip and unread decrement happen synchronously; the server
    /// call runs in the background and a failure is logged, not rolled
    /// back. Unknown or already-read ids are no-ops. Returns true if the
    /// record was flipped.
    pub fn mark_read(&self, id: &str) -> bool {
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(record) = inner
                .records
                .iter_mut()
                .find(|r| r.id == id && !r.is_read)
            else {
                return false;
            };
            record.is_read = true;
            inner.unread = inner.unread.saturating_sub(1);
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.mark_read(&id).await {
                warn!(notification_id = %id, error = %e, "mark-read not confirmed by server");
            }
        });
        true
    }

    /// Mark every record as read, with a single batched server call.
    pub fn mark_all_read(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            for record in inner.records.iter_mut() {
                record.is_read = true;
            }
            inner.unread = 0;
        }

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            if let Err(e) = api.mark_all_read().await {
                warn!(error = %e, "mark-all-read not confirmed by server");
            }
        });
    }

    /// Remove a record, adjusting the unread counter if it was unread.
    ///
    /// Returns true if a record was removed.
    pub fn delete(&self, id: &str) -> bool {
        {
            let mut inner = self.inner.lock().unwrap();
            let Some(pos) = inner.records.iter().position(|r| r.id == id) else {
                return false;
            };
            let record = inner.records.remove(pos);
            if !record.is_read {
                inner.unread = inner.unread.saturating_sub(1);
            }
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.delete(&id).await {
                warn!(notification_id = %id, error = %e, "delete not confirmed by server");
            }
        });
        true
    }

    /// Prepend a push-delivered notification as a fresh unread record.
    ///
    /// No merge by content is attempted; a duplicate of a server record is
    /// acceptable and resolved by the next [`fetch_all`](Self::fetch_all).
    pub fn ingest_push(&self, frame: &PushFrame) {
        let record = NotificationRecord {
            id: format!("local-{}", Uuid::new_v4()),
            message: frame.message.clone(),
            kind: frame.kind.clone(),
            deceased_id: frame.deceased_id.clone(),
            created_at: Some(Utc::now()),
            is_read: false,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(0, record);
        inner.unread += 1;
    }

    /// Snapshot of the records, newest first.
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    /// Badge-level summary.
    pub fn summary(&self) -> FeedSummary {
        let inner = self.inner.lock().unwrap();
        FeedSummary {
            unread: inner.unread,
            total: inner.records.len(),
        }
    }

    /// Current unread count.
    pub fn unread_count(&self) -> usize {
        self.inner.lock().unwrap().unread
    }

    /// Spawn the reconnect-resync watcher.
    ///
    /// Triggers exactly one [`fetch_all`](Self::fetch_all) each time the
    /// connection transitions into `Connected`. The task ends when the
    /// status channel is dropped.
    pub fn spawn_resync(&self, mut status_rx: watch::Receiver<ConnectionState>) -> JoinHandle<()> {
        let feed = self.clone();
        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let connected = status_rx.borrow_and_update().is_connected();
                if connected {
                    debug!("push channel reconnected; resyncing notification feed");
                    if let Err(e) = feed.fetch_all().await {
                        warn!(error = %e, "resync fetch failed");
                    }
                }
            }
        })
    }
}

/// Parse one raw list entry, dropping anything without an id and a message.
fn parse_record(value: serde_json::Value) -> Option<NotificationRecord> {
    match serde_json::from_value::<NotificationRecord>(value) {
        Ok(record) if !record.id.is_empty() && !record.message.is_empty() => Some(record),
        Ok(record) => {
            warn!(notification_id = %record.id, "dropping notification with empty id or message");
            None
        }
        Err(e) => {
            warn!(error = %e, "dropping unparseable notification entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_record_requires_id_and_message() {
        assert!(parse_record(json!({"id": "n1", "message": "hello"})).is_some());
        assert!(parse_record(json!({"id": "n1"})).is_none());
        assert!(parse_record(json!({"message": "orphan"})).is_none());
        assert!(parse_record(json!({"id": "", "message": "blank id"})).is_none());
        assert!(parse_record(json!("not an object")).is_none());
    }

    #[test]
    fn test_parse_record_wire_field_names() {
        let record = parse_record(json!({
            "id": "n7",
            "message": "Embalming scheduled",
            "type": "workflow",
            "deceasedId": "dc-33",
            "createdAt": "2026-08-30T10:00:00Z",
            "isRead": true
        }))
        .unwrap();

        assert_eq!(record.kind.as_deref(), Some("workflow"));
        assert_eq!(record.deceased_id.as_deref(), Some("dc-33"));
        assert!(record.is_read);
        assert!(record.created_at.is_some());
    }
}
