//! # vigil-feed
//!
//! Network-facing half of the Vigil notification core.
//!
//! This crate provides:
//! - [`PushClient`] - the single persistent push connection to the
//!   notification service, with status reporting and reconnect
//! - [`NotificationFeed`] - the durable, REST-backed notification list with
//!   optimistic local mutation and reconnect-triggered resync
//! - [`NotificationApi`] - the thin REST client both of those sit on
//!
//! Ephemeral alert handling lives in `vigil-alerts`; the chrome forwards
//! [`PushEvent`]s from here into that store.

pub mod client;
pub mod error;
pub mod push;
pub mod sync;

pub use client::NotificationApi;
pub use error::{FeedError, Result};
pub use push::{PushClient, PushEvent};
pub use sync::{FeedSummary, NotificationFeed, NotificationRecord};
