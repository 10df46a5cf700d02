//! Subscription history reads.
//!
//! Reconstructs the ordered list of past subscription terms for audit
//! display. Pure read path: every row the transition engine ever produced
//! shows up here unless it was soft-deleted by retention policy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;

use super::error::SubscriptionError;
use super::storage::{OrganizationStore, PlanStore, SubscriptionStatus, SubscriptionStore};

/// One row of an organization's subscription history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionHistoryEntry {
    pub id: Uuid,
    pub subscription_plan_id: Uuid,
    /// Catalog name of the plan; `None` when the catalog entry has since
    /// been removed.
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub metadata: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Read access to an organization's subscription history.
pub struct SubscriptionHistory<S> {
    store: S,
}

impl<S> SubscriptionHistory<S>
where
    S: SubscriptionStore + OrganizationStore + PlanStore,
{
    /// Create a new history reader.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All non-deleted subscription terms for the organization, newest
    /// first.
    pub async fn for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SubscriptionHistoryEntry>> {
        self.store
            .find_organization(organization_id)
            .await?
            .ok_or(SubscriptionError::OrganizationNotFound { organization_id })?;

        let records = self.store.list_for_organization(organization_id).await?;

        // Resolve each referenced plan once.
        let mut plan_names: HashMap<Uuid, Option<String>> = HashMap::new();
        for record in &records {
            if !plan_names.contains_key(&record.plan_id) {
                let name = self.store.find_plan(record.plan_id).await?.map(|p| p.name);
                plan_names.insert(record.plan_id, name);
            }
        }

        Ok(records
            .into_iter()
            .map(|record| SubscriptionHistoryEntry {
                id: record.id,
                subscription_plan_id: record.plan_id,
                plan_name: plan_names.get(&record.plan_id).cloned().flatten(),
                status: record.status,
                start_date: record.start_date,
                end_date: record.end_date,
                is_active: record.is_active,
                metadata: record.metadata,
                created_by: record.created_by,
                created_at: record.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::lifecycle::{
        CancellationRequest, RenewalRequest, SubscriptionLifecycle, UpgradeRequest,
    };
    use crate::subscriptions::storage::test::InMemorySubscriptionStore;
    use crate::subscriptions::storage::{
        DurationPeriod, Gym, Organization, StoredPlan, SubscriptionRecord,
    };
    use crate::FitsuiteError;
    use chrono::Days;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn seed_organization(store: &InMemorySubscriptionStore) -> Uuid {
        let id = Uuid::new_v4();
        store.seed_organization(Organization {
            id,
            name: "Ironworks".to_string(),
            deleted_at: None,
            gyms: vec![Gym {
                id: Uuid::new_v4(),
                name: "North".to_string(),
                client_count: 10,
                collaborator_count: 1,
            }],
        });
        id
    }

    fn seed_plan(store: &InMemorySubscriptionStore, name: &str) -> StoredPlan {
        let now = Utc::now();
        let plan = StoredPlan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: HashMap::from([("USD".to_string(), Decimal::new(4900, 2))]),
            duration: Some(1),
            duration_period: Some(DurationPeriod::Month),
            max_gyms: 10,
            max_clients_per_gym: 100,
            max_users_per_gym: 20,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        store.seed_plan(plan.clone());
        plan
    }

    fn seed_active_record(
        store: &InMemorySubscriptionStore,
        organization_id: Uuid,
        plan_id: Uuid,
    ) -> SubscriptionRecord {
        let now = Utc::now();
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            organization_id,
            plan_id,
            status: crate::subscriptions::storage::SubscriptionStatus::Active,
            start_date: now - Days::new(5),
            end_date: now + Days::new(25),
            is_active: true,
            metadata: json!({}),
            created_by: Some(Uuid::new_v4()),
            updated_by: None,
            created_at: now - chrono::Duration::hours(1),
            updated_at: now - chrono::Duration::hours(1),
            deleted_at: None,
        };
        store.seed_record(record.clone());
        record
    }

    #[tokio::test]
    async fn test_history_requires_the_organization() {
        let history = SubscriptionHistory::new(InMemorySubscriptionStore::new());
        let err = history.for_organization(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, FitsuiteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_is_empty_for_a_fresh_organization() {
        let store = InMemorySubscriptionStore::new();
        let organization_id = seed_organization(&store);
        let history = SubscriptionHistory::new(store);

        let entries = history.for_organization(organization_id).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_history_reflects_a_full_transition_chain() {
        let store = InMemorySubscriptionStore::new();
        let organization_id = seed_organization(&store);
        let starter = seed_plan(&store, "Starter");
        let pro = seed_plan(&store, "Pro");
        let seeded = seed_active_record(&store, organization_id, starter.id);

        let engine = SubscriptionLifecycle::new(store.clone());
        let admin = Uuid::new_v4();

        let renewed = engine
            .activate_renewal(organization_id, RenewalRequest::default(), admin)
            .await
            .unwrap();
        let upgraded = engine
            .upgrade(
                organization_id,
                UpgradeRequest {
                    new_subscription_plan_id: pro.id,
                    immediate_upgrade: Some(true),
                    notes: None,
                },
                admin,
            )
            .await
            .unwrap();
        engine
            .cancel(
                organization_id,
                CancellationRequest {
                    immediate_termination: false,
                    reason: "closing at end of term".to_string(),
                    notes: None,
                },
                admin,
            )
            .await
            .unwrap();

        let history = SubscriptionHistory::new(store);
        let entries = history.for_organization(organization_id).await.unwrap();

        // Cancel mutates the upgraded term in place, so three rows total,
        // newest first.
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, upgraded.id);
        assert_eq!(entries[1].id, renewed.id);
        assert_eq!(entries[2].id, seeded.id);

        // Each row still carries the metadata its transition recorded.
        assert_eq!(entries[0].plan_name.as_deref(), Some("Pro"));
        assert!(entries[0].is_active);
        assert_eq!(entries[0].metadata["pendingCancellation"], true);
        assert_eq!(entries[0].metadata["upgradedFrom"], "Starter");

        assert_eq!(entries[1].plan_name.as_deref(), Some("Starter"));
        assert!(!entries[1].is_active);
        assert_eq!(entries[1].metadata["deactivationReason"], "upgrade");

        assert!(!entries[2].is_active);
        assert_eq!(entries[2].metadata["deactivationReason"], "renewal");
        assert_eq!(entries[2].created_by, seeded.created_by);
    }

    #[tokio::test]
    async fn test_history_survives_a_removed_plan() {
        let store = InMemorySubscriptionStore::new();
        let organization_id = seed_organization(&store);
        let mut plan = seed_plan(&store, "Retired");
        seed_active_record(&store, organization_id, plan.id);

        // The catalog entry is soft-deleted after the term was recorded.
        plan.deleted_at = Some(Utc::now());
        store.seed_plan(plan);

        let history = SubscriptionHistory::new(store);
        let entries = history.for_organization(organization_id).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].plan_name, None);
    }
}
