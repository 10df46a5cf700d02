//! Input validation for lifecycle requests.

use crate::error::Result;

use super::error::SubscriptionError;

/// Validate a free-form note.
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidRequest` when the note exceeds
/// `max_length`.
pub fn validate_notes(notes: &str, max_length: usize) -> Result<()> {
    if notes.len() > max_length {
        return Err(SubscriptionError::InvalidRequest {
            field: "notes",
            reason: format!("must be at most {} characters", max_length),
        }
        .into());
    }
    Ok(())
}

/// Validate a cancellation reason.
///
/// Reasons are required and end up in audit metadata, so an empty or
/// whitespace-only value is rejected.
pub fn validate_reason(reason: &str, max_length: usize) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(SubscriptionError::InvalidRequest {
            field: "reason",
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    if reason.len() > max_length {
        return Err(SubscriptionError::InvalidRequest {
            field: "reason",
            reason: format!("must be at most {} characters", max_length),
        }
        .into());
    }
    Ok(())
}

/// Validate a renewal duration override.
pub fn validate_duration_months(months: u32, max_months: u32) -> Result<()> {
    if months == 0 {
        return Err(SubscriptionError::InvalidRequest {
            field: "duration_months",
            reason: "must be at least 1".to_string(),
        }
        .into());
    }
    if months > max_months {
        return Err(SubscriptionError::InvalidRequest {
            field: "duration_months",
            reason: format!("must be at most {}", max_months),
        }
        .into());
    }
    Ok(())
}
