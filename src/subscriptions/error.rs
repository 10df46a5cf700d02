//! Subscription-specific error types.
//!
//! Provides granular error types for lifecycle transitions, enabling better
//! error handling and more informative messages for API consumers.

use std::fmt;
use uuid::Uuid;

use super::limits::LimitViolation;

/// Subscription lifecycle errors.
///
/// These errors carry the context a caller needs to act on a failed
/// transition and can be converted to `FitsuiteError` for transport layers.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionError {
    // Lookup errors
    /// The organization is missing or soft-deleted.
    OrganizationNotFound { organization_id: Uuid },
    /// The referenced plan is missing or soft-deleted.
    PlanNotFound { plan_id: Uuid },
    /// The referenced plan exists but is not assignable.
    PlanNotAvailable { plan_id: Uuid },

    // Business rule violations
    /// The organization has no subscription in its active slot to act on.
    NoActiveSubscription { organization_id: Uuid },
    /// The upgrade target is the plan the organization is already on.
    SamePlanUpgrade { plan_id: Uuid },
    /// The organization's current usage does not fit the candidate plan.
    LimitsExceeded { violations: Vec<LimitViolation> },
    /// A request field failed validation.
    InvalidRequest { field: &'static str, reason: String },

    // Write conflicts
    /// The current record changed between read and write; retry from a
    /// fresh read.
    ConcurrentModification { organization_id: Uuid },
    /// More than one record occupies the organization's active slot. This is
    /// a stored-data invariant violation, not something the engine repairs.
    MultipleActiveSubscriptions { organization_id: Uuid },
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrganizationNotFound { organization_id } => {
                write!(f, "Organization not found: {}", organization_id)
            }
            Self::PlanNotFound { plan_id } => {
                write!(f, "Subscription plan not found: {}", plan_id)
            }
            Self::PlanNotAvailable { plan_id } => {
                write!(f, "Subscription plan {} is not available", plan_id)
            }
            Self::NoActiveSubscription { organization_id } => {
                write!(
                    f,
                    "Organization {} has no active subscription",
                    organization_id
                )
            }
            Self::SamePlanUpgrade { plan_id } => {
                write!(
                    f,
                    "Organization is already subscribed to plan {}",
                    plan_id
                )
            }
            Self::LimitsExceeded { violations } => {
                write!(f, "Current usage exceeds the plan's limits: ")?;
                for (i, violation) in violations.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", violation)?;
                }
                Ok(())
            }
            Self::InvalidRequest { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ConcurrentModification { organization_id } => {
                write!(
                    f,
                    "Subscription for organization {} was modified concurrently, please retry",
                    organization_id
                )
            }
            Self::MultipleActiveSubscriptions { organization_id } => {
                write!(
                    f,
                    "Organization {} has more than one active subscription record",
                    organization_id
                )
            }
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<SubscriptionError> for crate::error::FitsuiteError {
    fn from(err: SubscriptionError) -> Self {
        match &err {
            // Map to NotFound
            SubscriptionError::OrganizationNotFound { .. }
            | SubscriptionError::PlanNotFound { .. }
            | SubscriptionError::PlanNotAvailable { .. } => {
                crate::error::FitsuiteError::NotFound(err.to_string())
            }

            // Map to BadRequest (business rule violations)
            SubscriptionError::NoActiveSubscription { .. }
            | SubscriptionError::SamePlanUpgrade { .. }
            | SubscriptionError::LimitsExceeded { .. }
            | SubscriptionError::InvalidRequest { .. } => {
                crate::error::FitsuiteError::BadRequest(err.to_string())
            }

            // Map to Conflict (retry from a clean read)
            SubscriptionError::ConcurrentModification { .. }
            | SubscriptionError::MultipleActiveSubscriptions { .. } => {
                crate::error::FitsuiteError::Conflict(err.to_string())
            }
        }
    }
}

impl SubscriptionError {
    /// Check if this is a client error (bad input, missing resource).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::ConcurrentModification { .. } | Self::MultipleActiveSubscriptions { .. }
        )
    }

    /// Check if this error is resolvable by retrying from a fresh read.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::limits::LimitDimension;

    #[test]
    fn test_error_display() {
        let org = Uuid::nil();
        let err = SubscriptionError::NoActiveSubscription {
            organization_id: org,
        };
        assert_eq!(
            err.to_string(),
            format!("Organization {} has no active subscription", org)
        );
    }

    #[test]
    fn test_limits_exceeded_display_lists_every_dimension() {
        let err = SubscriptionError::LimitsExceeded {
            violations: vec![
                LimitViolation {
                    dimension: LimitDimension::Gyms,
                    current: 5,
                    allowed: 3,
                },
                LimitViolation {
                    dimension: LimitDimension::ClientsPerGym,
                    current: 60,
                    allowed: 50,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("5 gyms in use, plan allows 3"));
        assert!(message.contains("60 clients in the busiest gym, plan allows 50"));
    }

    #[test]
    fn test_error_classification() {
        let err = SubscriptionError::PlanNotFound {
            plan_id: Uuid::nil(),
        };
        assert!(err.is_client_error());
        assert!(!err.is_retryable());

        let err = SubscriptionError::ConcurrentModification {
            organization_id: Uuid::nil(),
        };
        assert!(!err.is_client_error());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_convert_to_fitsuite_error() {
        let err = SubscriptionError::OrganizationNotFound {
            organization_id: Uuid::nil(),
        };
        let converted: crate::FitsuiteError = err.into();
        assert!(matches!(converted, crate::FitsuiteError::NotFound(_)));

        let err = SubscriptionError::SamePlanUpgrade {
            plan_id: Uuid::nil(),
        };
        let converted: crate::FitsuiteError = err.into();
        assert!(matches!(converted, crate::FitsuiteError::BadRequest(_)));

        let err = SubscriptionError::MultipleActiveSubscriptions {
            organization_id: Uuid::nil(),
        };
        let converted: crate::FitsuiteError = err.into();
        assert!(matches!(converted, crate::FitsuiteError::Conflict(_)));
    }
}
