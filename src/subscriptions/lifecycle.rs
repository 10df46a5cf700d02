//! The subscription transition engine.
//!
//! State machine over a single organization's subscription slot. Each
//! transition loads the organization and its current active record,
//! validates the request, and commits its writes through one atomic store
//! operation: the new record's insertion and the old record's deactivation
//! either both happen or neither does.
//!
//! Transitions are intentionally not idempotent: activating a renewal twice
//! creates two terms. Request deduplication belongs to the calling layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;

use super::audit::{NoOpAuditLogger, SubscriptionAuditEvent, SubscriptionAuditLogger};
use super::config::LifecycleConfig;
use super::error::SubscriptionError;
use super::limits;
use super::metadata;
use super::period;
use super::storage::{
    Organization, OrganizationStore, PlanStore, SubscriptionRecord, SubscriptionStatus,
    SubscriptionStore,
};
use super::validation::{validate_duration_months, validate_notes, validate_reason};

/// Request to activate a renewal term.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalRequest {
    /// Plan for the new term. Defaults to the current plan; a different plan
    /// must be active and non-deleted.
    pub subscription_plan_id: Option<Uuid>,
    /// Explicit term length in months, overriding the plan's duration.
    pub duration_months: Option<u32>,
    pub notes: Option<String>,
}

/// Request to cancel the current subscription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
    /// Terminate now instead of letting the term run out.
    #[serde(default)]
    pub immediate_termination: bool,
    pub reason: String,
    pub notes: Option<String>,
}

/// Request to move the organization to a different plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub new_subscription_plan_id: Uuid,
    /// Apply now (deactivating the current term) or at the current term's
    /// end. Defaults to immediate.
    pub immediate_upgrade: Option<bool>,
    pub notes: Option<String>,
}

/// A subscription record reshaped for API consumers, with derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subscription_plan_id: Uuid,
    /// Catalog name of the plan; `None` when the catalog entry has since
    /// been removed.
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    /// Derived: the reference time is past the effective end date.
    pub is_expired: bool,
    /// Derived: whole days left in the term, never negative.
    pub days_remaining: u32,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionDetails {
    /// Reshape a stored record, deriving the display fields as of `now`.
    #[must_use]
    pub fn from_record(
        record: &SubscriptionRecord,
        plan_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: record.id,
            organization_id: record.organization_id,
            subscription_plan_id: record.plan_id,
            plan_name,
            status: record.status,
            start_date: record.start_date,
            end_date: record.end_date,
            is_active: record.is_active,
            is_expired: record.is_expired(now),
            days_remaining: record.days_remaining(now),
            metadata: record.metadata.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Subscription lifecycle operations.
///
/// Drives the three administrative transitions (renewal, cancellation,
/// upgrade) plus the current-slot read. All writes go through the store's
/// optimistic operations; a lost race surfaces as a conflict for the caller
/// to retry from a fresh read.
pub struct SubscriptionLifecycle<S, A = NoOpAuditLogger> {
    store: S,
    audit: A,
    config: LifecycleConfig,
}

impl<S> SubscriptionLifecycle<S, NoOpAuditLogger>
where
    S: SubscriptionStore + OrganizationStore + PlanStore,
{
    /// Create a lifecycle engine without audit logging.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_audit(store, NoOpAuditLogger)
    }
}

impl<S, A> SubscriptionLifecycle<S, A>
where
    S: SubscriptionStore + OrganizationStore + PlanStore,
    A: SubscriptionAuditLogger,
{
    /// Create a lifecycle engine with the given audit logger.
    #[must_use]
    pub fn with_audit(store: S, audit: A) -> Self {
        Self {
            store,
            audit,
            config: LifecycleConfig::default(),
        }
    }

    /// Replace the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Activate a renewal term for the organization.
    ///
    /// Deactivates the current record and inserts a fresh `ACTIVE` record in
    /// one atomic swap. The new term starts now; a renewal activated late
    /// is not back-dated to the old term's end.
    ///
    /// This operation is NOT idempotent: every call creates a new term.
    pub async fn activate_renewal(
        &self,
        organization_id: Uuid,
        request: RenewalRequest,
        acting_user: Uuid,
    ) -> Result<SubscriptionDetails> {
        if let Some(months) = request.duration_months {
            validate_duration_months(months, self.config.max_override_months)?;
        }
        if let Some(notes) = &request.notes {
            validate_notes(notes, self.config.max_note_length)?;
        }

        let (_organization, current) = self.load_slot(organization_id).await?;

        let plan_id = request.subscription_plan_id.unwrap_or(current.plan_id);
        let plan_changed = plan_id != current.plan_id;
        let plan = self
            .store
            .find_plan(plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound { plan_id })?;
        if plan_changed && !plan.is_active {
            return Err(SubscriptionError::PlanNotAvailable { plan_id }.into());
        }

        let previous_plan_name = if plan_changed {
            self.store
                .find_plan(current.plan_id)
                .await?
                .map(|p| p.name)
        } else {
            None
        };

        let now = Utc::now();
        let expected_version = current.updated_at;

        let mut deactivated = current.clone();
        deactivated.is_active = false;
        deactivated.updated_by = Some(acting_user);
        deactivated.updated_at = now;
        metadata::merge(
            &mut deactivated.metadata,
            json!({
                "deactivationReason": "renewal",
                "deactivatedAt": now,
                "deactivatedBy": acting_user,
            }),
        );

        let term = period::compute_period(now, &plan, request.duration_months);
        let mut record_metadata = json!({
            "activatedBy": acting_user,
            "activatedAt": now,
            "previousSubscriptionId": current.id,
        });
        if let Some(notes) = &request.notes {
            metadata::merge(&mut record_metadata, json!({ "notes": notes }));
        }
        if plan_changed {
            metadata::merge(
                &mut record_metadata,
                json!({
                    "previousPlanId": current.plan_id,
                    "previousPlanName": previous_plan_name,
                }),
            );
        }

        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            organization_id,
            plan_id,
            status: SubscriptionStatus::Active,
            start_date: term.start_date,
            end_date: term.end_date,
            is_active: true,
            metadata: record_metadata,
            created_by: Some(acting_user),
            updated_by: Some(acting_user),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.store
            .replace_active(&deactivated, expected_version, &record)
            .await?;

        self.audit
            .log(SubscriptionAuditEvent::RenewalActivated {
                organization_id,
                subscription_id: record.id,
                plan_id,
                acting_user,
            })
            .await;
        tracing::info!(
            target: "subscriptions",
            organization_id = %organization_id,
            subscription_id = %record.id,
            plan_id = %plan_id,
            "renewal activated"
        );

        Ok(SubscriptionDetails::from_record(
            &record,
            Some(plan.name),
            now,
        ))
    }

    /// Cancel the organization's current subscription.
    ///
    /// With `immediate_termination` the record becomes `INACTIVE` and its
    /// end date is pulled to now; the organization is deliberately left
    /// without a running subscription. Without it, the term runs out
    /// naturally and only metadata marks the pending cancellation for the
    /// expiry sweep to finalize.
    pub async fn cancel(
        &self,
        organization_id: Uuid,
        request: CancellationRequest,
        acting_user: Uuid,
    ) -> Result<SubscriptionDetails> {
        validate_reason(&request.reason, self.config.max_note_length)?;
        if let Some(notes) = &request.notes {
            validate_notes(notes, self.config.max_note_length)?;
        }

        let (_organization, current) = self.load_slot(organization_id).await?;

        let now = Utc::now();
        let expected_version = current.updated_at;

        let mut record = current;
        record.updated_by = Some(acting_user);
        record.updated_at = now;
        metadata::merge(
            &mut record.metadata,
            json!({
                "cancellationReason": request.reason,
                "cancelledBy": acting_user,
                "cancelledAt": now,
            }),
        );
        if let Some(notes) = &request.notes {
            metadata::merge(&mut record.metadata, json!({ "notes": notes }));
        }

        if request.immediate_termination {
            record.status = SubscriptionStatus::Inactive;
            record.end_date = now;
        } else {
            metadata::merge(
                &mut record.metadata,
                json!({
                    "pendingCancellation": true,
                    "scheduledCancellationDate": record.end_date,
                }),
            );
        }

        let updated = self
            .store
            .compare_and_update(&record, expected_version)
            .await?;
        if !updated {
            return Err(SubscriptionError::ConcurrentModification { organization_id }.into());
        }

        self.audit
            .log(SubscriptionAuditEvent::SubscriptionCancelled {
                organization_id,
                subscription_id: record.id,
                immediate: request.immediate_termination,
                acting_user,
            })
            .await;
        tracing::info!(
            target: "subscriptions",
            organization_id = %organization_id,
            subscription_id = %record.id,
            immediate = request.immediate_termination,
            "subscription cancelled"
        );

        let plan_name = self.store.find_plan(record.plan_id).await?.map(|p| p.name);
        Ok(SubscriptionDetails::from_record(&record, plan_name, now))
    }

    /// Move the organization to a different plan.
    ///
    /// The target plan must be assignable and different from the current
    /// one, and the organization's present footprint must fit its limits;
    /// any violation aborts before anything is written. An immediate upgrade
    /// (the default) swaps the slot like a renewal; a deferred upgrade only
    /// marks the current record `PENDING_UPGRADE` for the sweep to apply
    /// when the term ends.
    pub async fn upgrade(
        &self,
        organization_id: Uuid,
        request: UpgradeRequest,
        acting_user: Uuid,
    ) -> Result<SubscriptionDetails> {
        if let Some(notes) = &request.notes {
            validate_notes(notes, self.config.max_note_length)?;
        }

        let (organization, current) = self.load_slot(organization_id).await?;

        let plan_id = request.new_subscription_plan_id;
        let plan = self
            .store
            .find_plan(plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound { plan_id })?;
        if !plan.is_active {
            return Err(SubscriptionError::PlanNotAvailable { plan_id }.into());
        }
        if plan_id == current.plan_id {
            return Err(SubscriptionError::SamePlanUpgrade { plan_id }.into());
        }

        let violations = limits::check_plan_limits(&organization, &plan);
        if !violations.is_empty() {
            return Err(SubscriptionError::LimitsExceeded { violations }.into());
        }

        let current_plan_name = self
            .store
            .find_plan(current.plan_id)
            .await?
            .map(|p| p.name);

        let now = Utc::now();
        let expected_version = current.updated_at;
        let immediate = request.immediate_upgrade.unwrap_or(true);

        if immediate {
            let mut deactivated = current.clone();
            deactivated.is_active = false;
            deactivated.end_date = now;
            deactivated.updated_by = Some(acting_user);
            deactivated.updated_at = now;
            metadata::merge(
                &mut deactivated.metadata,
                json!({
                    "deactivationReason": "upgrade",
                    "deactivatedAt": now,
                    "deactivatedBy": acting_user,
                }),
            );

            let term = period::compute_period(now, &plan, None);
            let mut record_metadata = json!({
                "upgradedFrom": current_plan_name,
                "upgradedTo": plan.name.clone(),
                "upgradedBy": acting_user,
                "upgradedAt": now,
                "previousSubscriptionId": current.id,
            });
            if let Some(notes) = &request.notes {
                metadata::merge(&mut record_metadata, json!({ "notes": notes }));
            }

            let record = SubscriptionRecord {
                id: Uuid::new_v4(),
                organization_id,
                plan_id,
                status: SubscriptionStatus::Active,
                start_date: term.start_date,
                end_date: term.end_date,
                is_active: true,
                metadata: record_metadata,
                created_by: Some(acting_user),
                updated_by: Some(acting_user),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };

            self.store
                .replace_active(&deactivated, expected_version, &record)
                .await?;

            self.audit
                .log(SubscriptionAuditEvent::UpgradeApplied {
                    organization_id,
                    subscription_id: record.id,
                    from_plan_id: current.plan_id,
                    to_plan_id: plan_id,
                    acting_user,
                })
                .await;
            tracing::info!(
                target: "subscriptions",
                organization_id = %organization_id,
                subscription_id = %record.id,
                from_plan = %current.plan_id,
                to_plan = %plan_id,
                "upgrade applied"
            );

            Ok(SubscriptionDetails::from_record(
                &record,
                Some(plan.name),
                now,
            ))
        } else {
            let mut record = current;
            record.status = SubscriptionStatus::PendingUpgrade;
            record.updated_by = Some(acting_user);
            record.updated_at = now;
            metadata::merge(
                &mut record.metadata,
                json!({
                    "pendingUpgrade": {
                        "subscriptionPlanId": plan.id,
                        "planName": plan.name,
                        "upgradeDate": record.end_date,
                        "requestedBy": acting_user,
                        "requestedAt": now,
                    },
                }),
            );
            if let Some(notes) = &request.notes {
                metadata::merge(&mut record.metadata, json!({ "notes": notes }));
            }

            let updated = self
                .store
                .compare_and_update(&record, expected_version)
                .await?;
            if !updated {
                return Err(
                    SubscriptionError::ConcurrentModification { organization_id }.into(),
                );
            }

            self.audit
                .log(SubscriptionAuditEvent::UpgradeScheduled {
                    organization_id,
                    subscription_id: record.id,
                    to_plan_id: plan_id,
                    acting_user,
                })
                .await;
            tracing::info!(
                target: "subscriptions",
                organization_id = %organization_id,
                subscription_id = %record.id,
                to_plan = %plan_id,
                "upgrade scheduled for end of term"
            );

            Ok(SubscriptionDetails::from_record(
                &record,
                current_plan_name,
                now,
            ))
        }
    }

    /// Get the record currently occupying the organization's subscription
    /// slot, reshaped for display. Pure read.
    pub async fn current(&self, organization_id: Uuid) -> Result<Option<SubscriptionDetails>> {
        self.store
            .find_organization(organization_id)
            .await?
            .ok_or(SubscriptionError::OrganizationNotFound { organization_id })?;

        match self.store.find_active(organization_id).await? {
            Some(record) => {
                let plan_name = self.store.find_plan(record.plan_id).await?.map(|p| p.name);
                Ok(Some(SubscriptionDetails::from_record(
                    &record,
                    plan_name,
                    Utc::now(),
                )))
            }
            None => Ok(None),
        }
    }

    /// Load the organization and the record in its subscription slot.
    async fn load_slot(
        &self,
        organization_id: Uuid,
    ) -> Result<(Organization, SubscriptionRecord)> {
        let organization = self
            .store
            .find_organization(organization_id)
            .await?
            .ok_or(SubscriptionError::OrganizationNotFound { organization_id })?;
        let current = self
            .store
            .find_active(organization_id)
            .await?
            .ok_or(SubscriptionError::NoActiveSubscription { organization_id })?;
        Ok((organization, current))
    }
}
