//! # vigil-alerts
//!
//! Ephemeral alert handling for the Vigil console.
//!
//! This crate provides:
//! - [`AlertStore`] - the owned, ordered set of currently visible alerts,
//!   including TTL expiry, dismissal, and consolidation
//! - [`ToneEmitter`] - gesture-gated audible cue with fallback
//! - [`DashboardView`] - pure mapping from store/feed state to render fields
//!
//! Alerts are push-driven and short-lived; durable notifications live in
//! `vigil-feed`.

pub mod store;
pub mod tone;
pub mod view;

pub use store::{Alert, AlertSnapshot, AlertStore, ConsolidatedAlert};
pub use tone::{BellSink, ToneEmitter, ToneSink};
pub use view::{AlertCard, BannerView, DashboardView};
