//! Billing period computation.
//!
//! Term boundaries are calendar-aware: adding a month to Jan 31 lands on
//! the last day of February, it does not spill into March. All arithmetic
//! goes through `chrono`'s month/day durations, never raw milliseconds.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};

use super::storage::{DurationPeriod, StoredPlan};

/// Term length applied when a plan defines no duration.
pub const DEFAULT_TERM_MONTHS: u32 = 1;

/// Seconds per day, for the remaining-days ceiling.
const DAY_SECONDS: i64 = 86_400;

/// Start and end of one subscription term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Compute the term starting at `start` for `plan`.
///
/// Resolution order:
/// 1. An explicit `override_months` wins over everything.
/// 2. The plan's own `duration` + `duration_period`.
/// 3. [`DEFAULT_TERM_MONTHS`].
#[must_use]
pub fn compute_period(
    start: DateTime<Utc>,
    plan: &StoredPlan,
    override_months: Option<u32>,
) -> BillingPeriod {
    let end_date = if let Some(months) = override_months {
        start + Months::new(months)
    } else {
        match (plan.duration, plan.duration_period) {
            (Some(duration), Some(DurationPeriod::Month)) => start + Months::new(duration),
            (Some(duration), Some(DurationPeriod::Day)) => start + Days::new(u64::from(duration)),
            _ => start + Months::new(DEFAULT_TERM_MONTHS),
        }
    };

    BillingPeriod {
        start_date: start,
        end_date,
    }
}

/// Whole days left until `end_date` as of `now`, rounded up, never negative.
///
/// A term with any time left counts a full day; an expired term counts 0.
#[must_use]
pub fn days_remaining(end_date: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let seconds = (end_date - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    ((seconds + DAY_SECONDS - 1) / DAY_SECONDS) as u32
}

/// Check if a term has run out as of `now`.
#[must_use]
pub fn is_expired(end_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > end_date
}
