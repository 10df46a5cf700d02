//! Storage traits for subscription lifecycle data.
//!
//! Implement these traits to persist subscription state to your database.
//! An in-memory implementation is provided for testing.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::period;

/// One term of an organization's relationship to a plan.
///
/// A new record is created whenever a term begins (renewal or immediate
/// upgrade); the record is mutated in place when cancelled, renewed away
/// from, or marked for a deferred upgrade. Records are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    /// Term start.
    pub start_date: DateTime<Utc>,
    /// Term end. For an immediately terminated subscription this is the
    /// moment of termination, not the originally scheduled end.
    pub end_date: DateTime<Utc>,
    /// Marks the organization's current subscription slot.
    ///
    /// Invariant: at most one record per organization has `is_active = true`
    /// and `deleted_at = None` at any time.
    pub is_active: bool,
    /// Open provenance bag (JSON object, merge-only). Records who triggered
    /// each change, when, why, and links to the prior/next term.
    pub metadata: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Doubles as the optimistic-concurrency version token, see
    /// [`SubscriptionStore::compare_and_update`].
    pub updated_at: DateTime<Utc>,
    /// Soft delete, reserved for data-retention policy. Normal transitions
    /// never set it.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Check if this record occupies the organization's subscription slot.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }

    /// Check if the term has run out as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        period::is_expired(self.end_date, now)
    }

    /// Whole days left in the term as of `now`, never negative.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> u32 {
        period::days_remaining(self.end_date, now)
    }
}

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// The term is running.
    Active,
    /// The term was terminated (or expired and swept).
    Inactive,
    /// The term is running but a plan change is scheduled for its end.
    PendingUpgrade,
}

impl SubscriptionStatus {
    /// Convert to the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::PendingUpgrade => "PENDING_UPGRADE",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a status string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid_value: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid subscription status: '{}' (expected: ACTIVE, INACTIVE, or PENDING_UPGRADE)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SubscriptionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "PENDING_UPGRADE" => Ok(Self::PendingUpgrade),
            _ => Err(ParseStatusError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// Unit of a plan's term duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DurationPeriod {
    Month,
    Day,
}

impl DurationPeriod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "MONTH",
            Self::Day => "DAY",
        }
    }
}

impl fmt::Display for DurationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription plan as stored in the catalog.
///
/// The lifecycle engine never mutates plans; it reads them by id for term
/// computation and limit checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPlan {
    pub id: Uuid,
    /// Display name, unique among non-deleted plans.
    pub name: String,
    /// Currency code -> amount.
    pub price: HashMap<String, Decimal>,
    /// Term length in `duration_period` units. `None` means the platform
    /// default term applies.
    pub duration: Option<u32>,
    pub duration_period: Option<DurationPeriod>,
    pub max_gyms: u32,
    pub max_clients_per_gym: u32,
    pub max_users_per_gym: u32,
    /// Whether the plan can be newly assigned. Inactive plans stay valid for
    /// subscriptions already on them.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A gym with the usage counts the limit validator needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gym {
    pub id: Uuid,
    pub name: String,
    /// Non-deleted clients registered at this gym.
    pub client_count: u32,
    /// Non-deleted collaborators working at this gym, excluding the owner.
    pub collaborator_count: u32,
}

impl Gym {
    /// Users of this gym: collaborators plus the owner.
    #[must_use]
    pub fn user_count(&self) -> u32 {
        self.collaborator_count + 1
    }
}

/// Organization read model: the tenant root with its non-deleted gyms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub gyms: Vec<Gym>,
}

impl Organization {
    /// Number of non-deleted gyms.
    #[must_use]
    pub fn gym_count(&self) -> u32 {
        self.gyms.len() as u32
    }

    /// Client count of the most loaded gym, 0 when there are no gyms.
    #[must_use]
    pub fn peak_clients_per_gym(&self) -> u32 {
        self.gyms.iter().map(|g| g.client_count).max().unwrap_or(0)
    }

    /// User count of the most loaded gym, 0 when there are no gyms.
    #[must_use]
    pub fn peak_users_per_gym(&self) -> u32 {
        self.gyms.iter().map(Gym::user_count).max().unwrap_or(0)
    }
}

/// Trait for looking up organizations.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Get a non-deleted organization with its non-deleted gyms and per-gym
    /// usage counts. Returns `None` for missing or soft-deleted
    /// organizations.
    async fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>>;
}

/// Trait for reading the plan catalog.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Get a non-deleted plan by id. Callers that require an assignable plan
    /// must additionally check [`StoredPlan::is_active`].
    async fn find_plan(&self, plan_id: Uuid) -> Result<Option<StoredPlan>>;
}

/// Trait for storing subscription records.
///
/// All write operations are optimistic: they take the `updated_at` value the
/// caller read, and return `Ok(false)` without writing when the row has been
/// modified since. Implementations MUST make this check-and-write atomic
/// (`UPDATE ... WHERE id = $1 AND updated_at = $2` or equivalent); a
/// read-then-write sequence would reintroduce the lost-update race this
/// contract exists to prevent.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Get the record currently occupying the organization's subscription
    /// slot (`is_active = true`, not soft-deleted), if any.
    ///
    /// Implementations should fail with a conflict rather than pick a winner
    /// when more than one such row is observed.
    async fn find_active(&self, organization_id: Uuid) -> Result<Option<SubscriptionRecord>>;

    /// All non-deleted records for an organization, newest `created_at`
    /// first.
    async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SubscriptionRecord>>;

    /// Persist an updated record if it still carries `expected_version` as
    /// its stored `updated_at`. Returns `Ok(false)` on a version mismatch.
    async fn compare_and_update(
        &self,
        record: &SubscriptionRecord,
        expected_version: DateTime<Utc>,
    ) -> Result<bool>;

    /// Persist a slot swap: write the deactivated old record and insert its
    /// replacement in a single transaction, guarded by the old record's
    /// version.
    ///
    /// Fails with a conflict (nothing written) when the old record's stored
    /// `updated_at` no longer matches `expected_version`. A partial write
    /// here would break the single-active-slot invariant, so both statements
    /// must commit together or not at all.
    async fn replace_active(
        &self,
        deactivated: &SubscriptionRecord,
        expected_version: DateTime<Utc>,
        replacement: &SubscriptionRecord,
    ) -> Result<()>;
}

/// In-memory stores for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use crate::subscriptions::error::SubscriptionError;
    use std::sync::{Arc, RwLock};

    /// In-memory subscription store for testing.
    ///
    /// Implements all three storage traits. Wraps data in `Arc` for cheap
    /// cloning, so the same store can back several managers in a test.
    #[derive(Default, Clone)]
    pub struct InMemorySubscriptionStore {
        inner: Arc<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        organizations: RwLock<HashMap<Uuid, Organization>>,
        plans: RwLock<HashMap<Uuid, StoredPlan>>,
        records: RwLock<HashMap<Uuid, SubscriptionRecord>>,
    }

    impl InMemorySubscriptionStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an organization.
        pub fn seed_organization(&self, organization: Organization) {
            self.inner
                .organizations
                .write()
                .unwrap()
                .insert(organization.id, organization);
        }

        /// Seed a plan.
        pub fn seed_plan(&self, plan: StoredPlan) {
            self.inner.plans.write().unwrap().insert(plan.id, plan);
        }

        /// Seed a subscription record, bypassing the engine (for setting up
        /// the pre-existing active subscription a test starts from).
        pub fn seed_record(&self, record: SubscriptionRecord) {
            self.inner.records.write().unwrap().insert(record.id, record);
        }

        /// All records, in no particular order (for invariant assertions).
        pub fn all_records(&self) -> Vec<SubscriptionRecord> {
            self.inner.records.read().unwrap().values().cloned().collect()
        }

        /// Count of current-slot records for an organization.
        pub fn active_count(&self, organization_id: Uuid) -> usize {
            self.inner
                .records
                .read()
                .unwrap()
                .values()
                .filter(|r| r.organization_id == organization_id && r.is_current())
                .count()
        }
    }

    #[async_trait]
    impl OrganizationStore for InMemorySubscriptionStore {
        async fn find_organization(
            &self,
            organization_id: Uuid,
        ) -> Result<Option<Organization>> {
            Ok(self
                .inner
                .organizations
                .read()
                .unwrap()
                .get(&organization_id)
                .filter(|o| o.deleted_at.is_none())
                .cloned())
        }
    }

    #[async_trait]
    impl PlanStore for InMemorySubscriptionStore {
        async fn find_plan(&self, plan_id: Uuid) -> Result<Option<StoredPlan>> {
            Ok(self
                .inner
                .plans
                .read()
                .unwrap()
                .get(&plan_id)
                .filter(|p| p.deleted_at.is_none())
                .cloned())
        }
    }

    #[async_trait]
    impl SubscriptionStore for InMemorySubscriptionStore {
        async fn find_active(
            &self,
            organization_id: Uuid,
        ) -> Result<Option<SubscriptionRecord>> {
            let records = self.inner.records.read().unwrap();
            let mut current: Option<&SubscriptionRecord> = None;
            for record in records.values() {
                if record.organization_id != organization_id || !record.is_current() {
                    continue;
                }
                if current.is_some() {
                    return Err(SubscriptionError::MultipleActiveSubscriptions {
                        organization_id,
                    }
                    .into());
                }
                current = Some(record);
            }
            Ok(current.cloned())
        }

        async fn list_for_organization(
            &self,
            organization_id: Uuid,
        ) -> Result<Vec<SubscriptionRecord>> {
            let records = self.inner.records.read().unwrap();
            let mut rows: Vec<SubscriptionRecord> = records
                .values()
                .filter(|r| r.organization_id == organization_id && r.deleted_at.is_none())
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn compare_and_update(
            &self,
            record: &SubscriptionRecord,
            expected_version: DateTime<Utc>,
        ) -> Result<bool> {
            let mut records = self.inner.records.write().unwrap();
            match records.get(&record.id) {
                Some(stored) if stored.updated_at == expected_version => {}
                _ => return Ok(false),
            }
            records.insert(record.id, record.clone());
            Ok(true)
        }

        async fn replace_active(
            &self,
            deactivated: &SubscriptionRecord,
            expected_version: DateTime<Utc>,
            replacement: &SubscriptionRecord,
        ) -> Result<()> {
            // Single lock held across both writes, standing in for the
            // transaction a real store runs.
            let mut records = self.inner.records.write().unwrap();

            match records.get(&deactivated.id) {
                Some(stored) if stored.updated_at == expected_version => {}
                _ => {
                    return Err(SubscriptionError::ConcurrentModification {
                        organization_id: deactivated.organization_id,
                    }
                    .into())
                }
            }

            let another_active = records.values().any(|r| {
                r.organization_id == replacement.organization_id
                    && r.id != deactivated.id
                    && r.is_current()
            });
            if another_active {
                return Err(SubscriptionError::MultipleActiveSubscriptions {
                    organization_id: replacement.organization_id,
                }
                .into());
            }

            records.insert(deactivated.id, deactivated.clone());
            records.insert(replacement.id, replacement.clone());
            Ok(())
        }
    }
}
