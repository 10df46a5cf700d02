//! Audit logging for subscription transitions.
//!
//! Provides a trait-based audit logging system for tracking lifecycle
//! events. Useful for compliance, debugging, and support tooling.

use std::fmt;
use uuid::Uuid;

/// Audit event types for subscription transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionAuditEvent {
    /// A renewal term was activated.
    RenewalActivated {
        organization_id: Uuid,
        subscription_id: Uuid,
        plan_id: Uuid,
        acting_user: Uuid,
    },
    /// A subscription was cancelled.
    SubscriptionCancelled {
        organization_id: Uuid,
        subscription_id: Uuid,
        immediate: bool,
        acting_user: Uuid,
    },
    /// An upgrade took effect immediately.
    UpgradeApplied {
        organization_id: Uuid,
        subscription_id: Uuid,
        from_plan_id: Uuid,
        to_plan_id: Uuid,
        acting_user: Uuid,
    },
    /// An upgrade was scheduled for the end of the current term.
    UpgradeScheduled {
        organization_id: Uuid,
        subscription_id: Uuid,
        to_plan_id: Uuid,
        acting_user: Uuid,
    },
}

impl fmt::Display for SubscriptionAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenewalActivated {
                organization_id,
                subscription_id,
                plan_id,
                acting_user,
            } => {
                write!(
                    f,
                    "Renewal activated: org={}, sub={}, plan={}, by={}",
                    organization_id, subscription_id, plan_id, acting_user
                )
            }
            Self::SubscriptionCancelled {
                organization_id,
                subscription_id,
                immediate,
                acting_user,
            } => {
                write!(
                    f,
                    "Subscription cancelled: org={}, sub={}, immediate={}, by={}",
                    organization_id, subscription_id, immediate, acting_user
                )
            }
            Self::UpgradeApplied {
                organization_id,
                subscription_id,
                from_plan_id,
                to_plan_id,
                acting_user,
            } => {
                write!(
                    f,
                    "Upgrade applied: org={}, sub={}, from={}, to={}, by={}",
                    organization_id, subscription_id, from_plan_id, to_plan_id, acting_user
                )
            }
            Self::UpgradeScheduled {
                organization_id,
                subscription_id,
                to_plan_id,
                acting_user,
            } => {
                write!(
                    f,
                    "Upgrade scheduled: org={}, sub={}, to={}, by={}",
                    organization_id, subscription_id, to_plan_id, acting_user
                )
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implement this trait to integrate with your logging system (database,
/// external service, file-based logging).
pub trait SubscriptionAuditLogger: Send + Sync {
    /// Log a subscription audit event.
    ///
    /// Implementations should handle failures gracefully to avoid disrupting
    /// the transition that emitted the event.
    async fn log(&self, event: SubscriptionAuditEvent);
}

/// No-op audit logger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl SubscriptionAuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: SubscriptionAuditEvent) {
        // No-op
    }
}

/// Tracing-based audit logger.
///
/// Logs audit events using the `tracing` crate at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl SubscriptionAuditLogger for TracingAuditLogger {
    async fn log(&self, event: SubscriptionAuditEvent) {
        tracing::info!(
            target: "subscriptions::audit",
            event_type = %event_kind(&event),
            "{}", event
        );
    }
}

/// Get the event kind as a string for structured logging.
fn event_kind(event: &SubscriptionAuditEvent) -> &'static str {
    match event {
        SubscriptionAuditEvent::RenewalActivated { .. } => "renewal_activated",
        SubscriptionAuditEvent::SubscriptionCancelled { .. } => "subscription_cancelled",
        SubscriptionAuditEvent::UpgradeApplied { .. } => "upgrade_applied",
        SubscriptionAuditEvent::UpgradeScheduled { .. } => "upgrade_scheduled",
    }
}

/// Capturing audit logger for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Audit logger that records events for assertions.
    #[derive(Default, Clone)]
    pub struct RecordingAuditLogger {
        events: Arc<Mutex<Vec<SubscriptionAuditEvent>>>,
    }

    impl RecordingAuditLogger {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of the events logged so far.
        pub fn events(&self) -> Vec<SubscriptionAuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SubscriptionAuditLogger for RecordingAuditLogger {
        async fn log(&self, event: SubscriptionAuditEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::RecordingAuditLogger;
    use super::*;

    #[tokio::test]
    async fn test_noop_logger() {
        let logger = NoOpAuditLogger;
        logger
            .log(SubscriptionAuditEvent::RenewalActivated {
                organization_id: Uuid::new_v4(),
                subscription_id: Uuid::new_v4(),
                plan_id: Uuid::new_v4(),
                acting_user: Uuid::new_v4(),
            })
            .await;
        // Just verifies it doesn't panic
    }

    #[tokio::test]
    async fn test_recording_logger() {
        let logger = RecordingAuditLogger::new();
        let org = Uuid::new_v4();

        logger
            .log(SubscriptionAuditEvent::UpgradeScheduled {
                organization_id: org,
                subscription_id: Uuid::new_v4(),
                to_plan_id: Uuid::new_v4(),
                acting_user: Uuid::new_v4(),
            })
            .await;

        let events = logger.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SubscriptionAuditEvent::UpgradeScheduled { organization_id, .. } if organization_id == org
        ));
    }

    #[test]
    fn test_event_display() {
        let org = Uuid::new_v4();
        let event = SubscriptionAuditEvent::SubscriptionCancelled {
            organization_id: org,
            subscription_id: Uuid::new_v4(),
            immediate: true,
            acting_user: Uuid::new_v4(),
        };
        let display = format!("{}", event);
        assert!(display.contains(&org.to_string()));
        assert!(display.contains("immediate=true"));
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(
            event_kind(&SubscriptionAuditEvent::UpgradeApplied {
                organization_id: Uuid::nil(),
                subscription_id: Uuid::nil(),
                from_plan_id: Uuid::nil(),
                to_plan_id: Uuid::nil(),
                acting_user: Uuid::nil(),
            }),
            "upgrade_applied"
        );
    }
}
