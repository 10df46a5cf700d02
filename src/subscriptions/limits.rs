//! Plan limit validation for upgrades.
//!
//! Before an organization moves to a new plan, its current footprint must
//! fit the candidate plan's limits. The per-gym limits apply to the most
//! loaded gym individually, not to usage summed across gyms.

use serde::Serialize;
use std::fmt;

use super::storage::{Organization, StoredPlan};

/// A dimension a plan limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitDimension {
    /// Total non-deleted gyms in the organization.
    Gyms,
    /// Clients registered at a single gym.
    ClientsPerGym,
    /// Users (collaborators plus the owner) of a single gym.
    UsersPerGym,
}

impl LimitDimension {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gyms => "gyms",
            Self::ClientsPerGym => "clients_per_gym",
            Self::UsersPerGym => "users_per_gym",
        }
    }
}

impl fmt::Display for LimitDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single exceeded limit, with the numbers for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitViolation {
    pub dimension: LimitDimension,
    /// The organization's current usage on this dimension.
    pub current: u32,
    /// What the candidate plan allows.
    pub allowed: u32,
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimension {
            LimitDimension::Gyms => write!(
                f,
                "{} gyms in use, plan allows {}",
                self.current, self.allowed
            ),
            LimitDimension::ClientsPerGym => write!(
                f,
                "{} clients in the busiest gym, plan allows {}",
                self.current, self.allowed
            ),
            LimitDimension::UsersPerGym => write!(
                f,
                "{} users in the busiest gym, plan allows {}",
                self.current, self.allowed
            ),
        }
    }
}

/// Check an organization's current usage against a candidate plan.
///
/// Returns every exceeded dimension; an empty vec means the organization
/// fits. The per-gym checks compare the plan limit against the single most
/// loaded gym (a plan must fit each gym individually, so summing across
/// gyms would accept organizations the plan cannot actually hold).
#[must_use]
pub fn check_plan_limits(organization: &Organization, plan: &StoredPlan) -> Vec<LimitViolation> {
    let mut violations = Vec::new();

    let gym_count = organization.gym_count();
    if gym_count > plan.max_gyms {
        violations.push(LimitViolation {
            dimension: LimitDimension::Gyms,
            current: gym_count,
            allowed: plan.max_gyms,
        });
    }

    let peak_clients = organization.peak_clients_per_gym();
    if peak_clients > plan.max_clients_per_gym {
        violations.push(LimitViolation {
            dimension: LimitDimension::ClientsPerGym,
            current: peak_clients,
            allowed: plan.max_clients_per_gym,
        });
    }

    let peak_users = organization.peak_users_per_gym();
    if peak_users > plan.max_users_per_gym {
        violations.push(LimitViolation {
            dimension: LimitDimension::UsersPerGym,
            current: peak_users,
            allowed: plan.max_users_per_gym,
        });
    }

    violations
}
