//! The single persistent push connection to the notification service.
//!
//! One [`PushClient`] owns one websocket; nothing else in the process opens
//! a second connection. Incoming frames are parsed as JSON and handed to
//! exactly one dispatch point (the event receiver); malformed frames are
//! logged and dropped. Drops and errors surface only as a status transition
//! to `Disconnected`, never as an error to callers, and the client retries
//! with a fixed delay for as long as it lives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::config::PushConfig;
use vigil_core::types::{ConnectionState, PushFrame, Severity, channel_default_severity, channels};

/// Buffer size for the push event channel.
const EVENT_CHANNEL_BUFFER: usize = 256;

/// A push frame paired with the default severity of its channel.
#[derive(Debug, Clone)]
pub struct PushEvent {
    /// The decoded frame
    pub frame: PushFrame,
    /// Default severity when the frame carries no explicit `type`
    pub default_severity: Severity,
}

/// Handle to the push connection.
///
/// Lifecycle is explicit: construct, [`connect`](Self::connect) once the
/// application mounts, [`shutdown`](Self::shutdown) on teardown. A client
/// is single-use; after shutdown a new one is constructed.
pub struct PushClient {
    url: String,
    reconnect_delay: Duration,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::Sender<PushEvent>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
}

impl PushClient {
    /// Create a client along with its event receiver (the single dispatch
    /// point) and a status receiver for the "Live"/"Offline" indicator.
    pub fn new(
        config: &PushConfig,
    ) -> (
        Self,
        mpsc::Receiver<PushEvent>,
        watch::Receiver<ConnectionState>,
    ) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        (
            Self {
                url: config.url.clone(),
                reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
                state_tx,
                event_tx,
                cancel: CancellationToken::new(),
                running: Arc::new(AtomicBool::new(false)),
            },
            event_rx,
            state_rx,
        )
    }

    /// Start the connection loop.
    ///
    /// Idempotent: calling while already connected or connecting is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("push client already connected; ignoring connect()");
            return;
        }

        let url = self.url.clone();
        let delay = self.reconnect_delay;
        let state_tx = self.state_tx.clone();
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            run_loop(url, delay, state_tx, event_tx, cancel).await;
        });
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Tear the connection down and stop reconnecting.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn run_loop(
    url: String,
    delay: Duration,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::Sender<PushEvent>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let _ = state_tx.send(ConnectionState::Connecting);
        info!(%url, "connecting to notification service");

        let connected = tokio::select! {
            result = connect_async(&url) => result,
            _ = cancel.cancelled() => break,
        };

        match connected {
            Ok((ws_stream, _)) => {
                let _ = state_tx.send(ConnectionState::Connected);
                info!("push channel connected");

                let mut read = ws_stream;
                loop {
                    tokio::select! {
                        msg = read.next() => match msg {
                            Some(Ok(msg)) => {
                                if !dispatch_frame(msg, &event_tx).await {
                                    // Receiver gone; the owning component is
                                    // being torn down.
                                    let _ = state_tx.send(ConnectionState::Disconnected);
                                    return;
                                }
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "push channel error");
                                break;
                            }
                            None => {
                                warn!("push channel closed by server");
                                break;
                            }
                        },
                        _ = cancel.cancelled() => {
                            info!("push client shutting down");
                            let _ = state_tx.send(ConnectionState::Disconnected);
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "push connection failed");
            }
        }

        let _ = state_tx.send(ConnectionState::Disconnected);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => break,
        }
    }

    let _ = state_tx.send(ConnectionState::Disconnected);
}

/// Decode and forward one websocket message.
///
/// Returns false only when the event receiver has been dropped.
async fn dispatch_frame(msg: Message, event_tx: &mpsc::Sender<PushEvent>) -> bool {
    let text = match msg {
        Message::Text(text) => text,
        // Control frames and binary payloads carry no notifications.
        _ => return true,
    };

    if text.is_empty() {
        debug!("ignoring empty push frame (heartbeat)");
        return true;
    }

    let frame: PushFrame = match serde_json::from_str(text.as_str()) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, payload = %text, "dropping malformed push frame");
            return true;
        }
    };

    let default_severity =
        channel_default_severity(frame.channel.as_deref().unwrap_or(channels::GENERAL));

    if event_tx
        .send(PushEvent {
            frame,
            default_severity,
        })
        .await
        .is_err()
    {
        warn!("push event receiver dropped");
        return false;
    }
    true
}
