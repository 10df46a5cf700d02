//! Fitsuite - subscription lifecycle engine for the Fitsuite gym platform
//!
//! Fitsuite manages the plan assignment of an organization over time:
//! activating renewals, cancelling (immediately or at period end), and
//! upgrading to a larger plan, with resource-limit enforcement and
//! calendar-aware billing period math.
//!
//! Persistence is pluggable: implement the storage traits in
//! [`subscriptions::storage`] against your database and hand the store to a
//! [`subscriptions::SubscriptionLifecycle`]. An in-memory store is available
//! for tests behind the `test-support` feature.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fitsuite::subscriptions::{
//!     CancellationRequest, SubscriptionLifecycle, TracingAuditLogger,
//! };
//!
//! fitsuite::init_tracing();
//!
//! let lifecycle = SubscriptionLifecycle::with_audit(store, TracingAuditLogger);
//!
//! let status = lifecycle
//!     .cancel(org_id, CancellationRequest {
//!         immediate_termination: false,
//!         reason: "payment dispute".into(),
//!         notes: None,
//!     }, admin_id)
//!     .await?;
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

mod error;
pub mod subscriptions;

// Re-exports for public API
pub use error::{ErrorContext, ErrorWithContext, FitsuiteError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "fitsuite=debug")
/// - `FITSUITE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("FITSUITE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
