//! The authoritative set of currently-visible ephemeral alerts.
//!
//! The store owns alert lifecycle end to end: id assignment, newest-first
//! ordering, timed expiry, dismissal, and consolidation past a display
//! threshold. All TTL and exit-window scheduling lives here, behind a timer
//! registry keyed by alert id, so cancellation-on-removal is enforced in one
//! place. Removal is idempotent by id: a timer firing after a user dismissal
//! (or the other way around) is a safe no-op.
//!
//! ## Lifecycle
//!
//! ingest → visible for the TTL (10 s default) → `dismissing` → removed after
//! the exit window (300 ms default), or removed early by explicit dismissal.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use tracing::{debug, trace};

use vigil_core::config::AlertConfig;
use vigil_core::types::{PushFrame, Severity};

use crate::tone::ToneEmitter;

/// A single ephemeral alert.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Process-unique identifier, assigned at ingestion (never reused)
    pub id: u64,
    /// Message payload
    pub message: String,
    /// Severity, resolved at the ingestion boundary
    pub severity: Severity,
    /// When the alert was ingested
    pub received_at: DateTime<Utc>,
    /// True during the exit-transition window before removal
    pub dismissing: bool,
    /// Optional reference to a deceased record
    pub deceased_id: Option<String>,
    /// Opaque pass-through of any other frame fields
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Consolidated-banner summary, present when the alert count exceeds the
/// display threshold.
#[derive(Debug, Clone)]
pub struct ConsolidatedAlert {
    /// Total number of concurrent alerts (nothing is dropped from the count)
    pub total: usize,
    /// Highest-priority alert; ties broken by most recent
    pub top: Alert,
}

/// Point-in-time view of the store, for rendering.
#[derive(Debug, Clone)]
pub struct AlertSnapshot {
    /// Alerts, newest first
    pub alerts: Vec<Alert>,
    /// Whether the alert view is minimized
    pub minimized: bool,
    /// Consolidated summary when over the threshold
    pub consolidated: Option<ConsolidatedAlert>,
}

#[derive(Default)]
struct AlertTimers {
    expiry: Option<AbortHandle>,
    exit: Option<AbortHandle>,
}

struct StoreInner {
    alerts: VecDeque<Alert>,
    timers: HashMap<u64, AlertTimers>,
    next_id: u64,
    minimized: bool,
}

/// Owned, ordered collection of active alerts.
///
/// Cheap to clone; all clones share state. External access goes through the
/// public methods only.
#[derive(Clone)]
pub struct AlertStore {
    inner: Arc<Mutex<StoreInner>>,
    tone: ToneEmitter,
    ttl: Duration,
    exit_window: Duration,
    threshold: usize,
}

impl AlertStore {
    /// Create a store with the given timing configuration and tone emitter.
    pub fn new(config: &AlertConfig, tone: ToneEmitter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                alerts: VecDeque::new(),
                timers: HashMap::new(),
                next_id: 1,
                minimized: false,
            })),
            tone,
            ttl: Duration::from_secs(config.ttl_secs),
            exit_window: Duration::from_millis(config.exit_window_ms),
            threshold: config.consolidation_threshold,
        }
    }

    /// Ingest a push frame as a new alert.
    ///
    /// Assigns a fresh id, resolves severity (frame `type` falling back to
    /// the channel default), inserts at the head, triggers the tone cue, and
    /// schedules auto-expiry. A critical alert forces the view out of its
    /// minimized state so it is never silently hidden.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ingest(&self, frame: PushFrame, default_severity: Severity) -> u64 {
        let severity = frame.severity_or(default_severity);
        let id = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;

            inner.alerts.push_front(Alert {
                id,
                message: frame.message,
                severity,
                received_at: Utc::now(),
                dismissing: false,
                deceased_id: frame.deceased_id,
                extra: frame.extra,
            });
            inner.timers.insert(id, AlertTimers::default());

            if severity == Severity::Critical && inner.minimized {
                inner.minimized = false;
                debug!(alert_id = id, "critical alert forced un-minimize");
            }
            id
        };

        self.tone.play();
        self.schedule_expiry(id);
        trace!(alert_id = id, severity = severity.label(), "alert ingested");
        id
    }

    /// Dismiss an alert.
    ///
    /// Marks it `dismissing` immediately, cancels its expiry timer, and
    /// removes it after the exit window. Unknown ids and repeat calls are
    /// no-ops.
    pub fn dismiss(&self, id: u64) {
        {
            let mut guard = self.inner.lock().unwrap();
            let inner = &mut *guard;
            let Some(alert) = inner.alerts.iter_mut().find(|a| a.id == id) else {
                trace!(alert_id = id, "dismiss of unknown alert ignored");
                return;
            };
            if alert.dismissing {
                return;
            }
            alert.dismissing = true;

            if let Some(timers) = inner.timers.get_mut(&id) {
                if let Some(expiry) = timers.expiry.take() {
                    expiry.abort();
                }
            }
        }

        let store = self.clone();
        let window = self.exit_window;
        let exit = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            store.remove_now(id);
        })
        .abort_handle();

        let mut inner = self.inner.lock().unwrap();
        match inner.timers.get_mut(&id) {
            Some(timers) => timers.exit = Some(exit),
            // Removed by another path in the meantime; the removal there
            // already happened, so the pending cleanup has nothing to do.
            None => exit.abort(),
        }
    }

    /// Dismiss every current alert and reset the minimized flag.
    ///
    /// Alerts ingested after this call are unaffected.
    pub fn dismiss_all(&self) {
        let ids: Vec<u64> = {
            let mut inner = self.inner.lock().unwrap();
            inner.minimized = false;
            inner.alerts.iter().map(|a| a.id).collect()
        };
        if ids.is_empty() {
            return;
        }
        debug!(count = ids.len(), "dismissing all alerts");
        for id in ids {
            self.dismiss(id);
        }
    }

    /// Point-in-time snapshot for rendering, newest first.
    pub fn snapshot(&self) -> AlertSnapshot {
        let inner = self.inner.lock().unwrap();
        AlertSnapshot {
            alerts: inner.alerts.iter().cloned().collect(),
            minimized: inner.minimized,
            consolidated: consolidated(&inner.alerts, self.threshold),
        }
    }

    /// Get a copy of a single alert by id.
    pub fn get(&self, id: u64) -> Option<Alert> {
        let inner = self.inner.lock().unwrap();
        inner.alerts.iter().find(|a| a.id == id).cloned()
    }

    /// Number of alerts currently in the store (including dismissing ones).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().alerts.len()
    }

    /// Returns true if no alerts are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the alert view is minimized.
    pub fn minimized(&self) -> bool {
        self.inner.lock().unwrap().minimized
    }

    /// Set the minimized flag.
    pub fn set_minimized(&self, minimized: bool) {
        self.inner.lock().unwrap().minimized = minimized;
    }

    /// Toggle the minimized flag, returning the new value.
    pub fn toggle_minimized(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.minimized = !inner.minimized;
        inner.minimized
    }

    fn schedule_expiry(&self, id: u64) {
        let store = self.clone();
        let ttl = self.ttl;
        let expiry = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            store.dismiss(id);
        })
        .abort_handle();

        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let still_live = inner
            .alerts
            .iter()
            .any(|a| a.id == id && !a.dismissing);
        match inner.timers.get_mut(&id) {
            Some(timers) if still_live => timers.expiry = Some(expiry),
            // Dismissed before the timer registered; dismissal owns cleanup.
            _ => expiry.abort(),
        }
    }

    fn remove_now(&self, id: u64) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.alerts.retain(|a| a.id != id);
        if let Some(timers) = inner.timers.remove(&id) {
            if let Some(expiry) = timers.expiry {
                expiry.abort();
            }
        }
        trace!(alert_id = id, "alert removed");
    }
}

/// Stable reduction over the current set: highest severity wins, ties go to
/// the most recent (the set iterates newest first).
fn consolidated(alerts: &VecDeque<Alert>, threshold: usize) -> Option<ConsolidatedAlert> {
    if alerts.len() <= threshold {
        return None;
    }
    let top = alerts.iter().fold(None::<&Alert>, |best, alert| match best {
        Some(b) if b.severity >= alert.severity => Some(b),
        _ => Some(alert),
    })?;
    Some(ConsolidatedAlert {
        total: alerts.len(),
        top: top.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::test_sinks::CountingSink;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn quiet_store() -> AlertStore {
        AlertStore::new(&AlertConfig::default(), ToneEmitter::bell(false))
    }

    fn frame(message: &str) -> PushFrame {
        PushFrame::new(message)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique_and_ordering_is_newest_first() {
        let store = quiet_store();

        for i in 0..20 {
            store.ingest(frame(&format!("alert {i}")), Severity::Info);
        }

        let snapshot = store.snapshot();
        let ids: HashSet<u64> = snapshot.alerts.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 20, "all ids pairwise distinct");
        assert_eq!(snapshot.alerts[0].message, "alert 19", "newest first");
        assert_eq!(snapshot.alerts[19].message, "alert 0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_severity_falls_back_to_channel_default() {
        let store = quiet_store();

        let id = store.ingest(frame("cold room at 9°C"), Severity::Warning);
        assert_eq!(store.get(id).unwrap().severity, Severity::Warning);

        let id = store.ingest(frame("power loss").with_kind("critical"), Severity::Warning);
        assert_eq!(store.get(id).unwrap().severity, Severity::Critical);
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_forces_unminimize() {
        let store = quiet_store();
        store.set_minimized(true);

        store.ingest(frame("routine note"), Severity::Info);
        assert!(store.minimized(), "info alert leaves the view minimized");

        store.ingest(frame("Body received").with_kind("critical"), Severity::Info);
        assert!(!store.minimized(), "critical alert un-minimizes immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_window() {
        let store = quiet_store();
        store.ingest(frame("will expire"), Severity::Info);

        // Not before the TTL.
        tokio::time::sleep(Duration::from_millis(9_900)).await;
        let snapshot = store.snapshot();
        assert_eq!(snapshot.alerts.len(), 1);
        assert!(!snapshot.alerts[0].dismissing);

        // Dismissing inside the exit window.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = store.snapshot();
        assert_eq!(snapshot.alerts.len(), 1);
        assert!(snapshot.alerts[0].dismissing);

        // Gone by TTL + exit window.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_dismiss_cancels_expiry() {
        let store = quiet_store();
        let id = store.ingest(frame("dismiss me"), Severity::Info);

        store.dismiss(id);
        assert!(store.get(id).unwrap().dismissing, "dismissing set immediately");

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.is_empty());

        // Advancing past the original TTL must not panic or resurrect.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_is_idempotent() {
        let store = quiet_store();
        let keeper = store.ingest(frame("keep"), Severity::Info);
        let id = store.ingest(frame("drop"), Severity::Info);

        store.dismiss(id);
        store.dismiss(id);
        store.dismiss(9999); // unknown id

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(store.len(), 1, "double dismiss never removes a different alert");
        assert!(store.get(keeper).is_some());

        // Dismiss after the alert is fully gone is also a no-op.
        store.dismiss(id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_all_wins_races() {
        let store = quiet_store();
        for i in 0..3 {
            store.ingest(frame(&format!("alert {i}")), Severity::Info);
        }
        store.set_minimized(true);

        // Expiry timers for all three are pending; one alert is already on
        // its way out.
        let snapshot = store.snapshot();
        store.dismiss(snapshot.alerts[0].id);
        store.dismiss_all();

        assert!(!store.minimized(), "dismiss_all resets minimized");
        assert!(store.snapshot().alerts.iter().all(|a| a.dismissing));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.is_empty());

        // Late expiry timers find nothing to do.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_all_spares_later_ingests() {
        let store = quiet_store();
        store.ingest(frame("old"), Severity::Info);
        store.dismiss_all();

        // Arrives during the exit window of the sweep.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = store.ingest(frame("fresh"), Severity::Info);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(fresh).unwrap().message, "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_consolidation_threshold() {
        let store = quiet_store();

        // Oldest to newest: info, warning, critical, info, info, info.
        for kind in ["info", "warning", "critical", "info", "info", "info"] {
            store.ingest(frame("ward event").with_kind(kind), Severity::Info);
        }

        let snapshot = store.snapshot();
        let banner = snapshot.consolidated.expect("six alerts exceed the threshold");
        assert_eq!(banner.total, 6);
        assert_eq!(banner.top.severity, Severity::Critical);

        // Dismissing the banner is equivalent to dismiss_all.
        store.dismiss_all();
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.is_empty());
        assert!(!store.minimized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_consolidation_at_threshold() {
        let store = quiet_store();
        for _ in 0..5 {
            store.ingest(frame("event"), Severity::Info);
        }
        assert!(store.snapshot().consolidated.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_consolidation_tie_goes_to_most_recent() {
        let store = quiet_store();
        let first_critical =
            store.ingest(frame("first").with_kind("critical"), Severity::Info);
        for _ in 0..4 {
            store.ingest(frame("noise"), Severity::Info);
        }
        let second_critical =
            store.ingest(frame("second").with_kind("critical"), Severity::Info);

        let banner = store.snapshot().consolidated.expect("over threshold");
        assert_eq!(banner.top.id, second_critical);
        assert_ne!(banner.top.id, first_critical);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_critical_ingest_and_dismiss() {
        let (sink, attempts) = CountingSink::new(false);
        let tone = ToneEmitter::new(Some(Box::new(sink)), Box::new(crate::tone::BellSink), true);
        tone.arm();

        let store = AlertStore::new(&AlertConfig::default(), tone);
        store.set_minimized(true);

        let id = store.ingest(
            frame("Body received").with_kind("critical"),
            Severity::Info,
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().severity, Severity::Critical);
        assert_eq!(attempts.load(Ordering::SeqCst), 1, "tone attempted once");
        assert!(!store.minimized());

        store.dismiss(id);
        assert!(store.get(id).unwrap().dismissing);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.is_empty());
    }
}
