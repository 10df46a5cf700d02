//! Subscription lifecycle management for organizations.
//!
//! An organization holds at most one active subscription record at a time.
//! This module owns the transitions that move that slot forward (renewal,
//! cancellation, upgrade), the limit validation and billing period math
//! those transitions depend on, and the history read path.
//!
//! # Example
//!
//! ```rust,ignore
//! use fitsuite::subscriptions::{
//!     RenewalRequest, SubscriptionLifecycle, TracingAuditLogger, UpgradeRequest,
//! };
//!
//! let lifecycle = SubscriptionLifecycle::with_audit(store, TracingAuditLogger);
//!
//! // Renew on the current plan for three months.
//! let status = lifecycle
//!     .activate_renewal(org_id, RenewalRequest {
//!         duration_months: Some(3),
//!         ..Default::default()
//!     }, admin_id)
//!     .await?;
//!
//! // Move to a bigger plan right away; fails if the organization's gyms
//! // don't fit the target plan's limits.
//! let status = lifecycle
//!     .upgrade(org_id, UpgradeRequest {
//!         new_subscription_plan_id: pro_plan_id,
//!         immediate_upgrade: Some(true),
//!         notes: None,
//!     }, admin_id)
//!     .await?;
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod limits;
pub mod metadata;
pub mod period;
pub mod storage;
pub mod validation;

// Lifecycle exports
pub use lifecycle::{
    CancellationRequest, RenewalRequest, SubscriptionDetails, SubscriptionLifecycle,
    UpgradeRequest,
};

// History exports
pub use history::{SubscriptionHistory, SubscriptionHistoryEntry};

// Storage exports
pub use storage::{
    DurationPeriod, Gym, Organization, OrganizationStore, ParseStatusError, PlanStore,
    StoredPlan, SubscriptionRecord, SubscriptionStatus, SubscriptionStore,
};

// Limit exports
pub use limits::{check_plan_limits, LimitDimension, LimitViolation};

// Period exports
pub use period::{compute_period, days_remaining, BillingPeriod, DEFAULT_TERM_MONTHS};

// Config exports
pub use config::LifecycleConfig;

// Audit exports
pub use audit::{
    NoOpAuditLogger, SubscriptionAuditEvent, SubscriptionAuditLogger, TracingAuditLogger,
};

// Error exports
pub use error::SubscriptionError;

// Validation exports
pub use validation::{validate_duration_months, validate_notes, validate_reason};

// Test exports
#[cfg(any(test, feature = "test-support"))]
pub use storage::test::InMemorySubscriptionStore;

#[cfg(any(test, feature = "test-support"))]
pub use audit::test::RecordingAuditLogger;
