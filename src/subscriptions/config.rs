//! Lifecycle engine configuration.

/// Configuration for the subscription lifecycle engine.
///
/// # Example
///
/// ```rust
/// use fitsuite::subscriptions::LifecycleConfig;
///
/// let config = LifecycleConfig::new()
///     .max_override_months(12)
///     .max_note_length(512);
/// ```
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Longest duration override (in months) accepted on a renewal.
    pub max_override_months: u32,

    /// Maximum length of free-form notes and cancellation reasons.
    pub max_note_length: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_override_months: 24,
            max_note_length: 1024,
        }
    }
}

impl LifecycleConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the longest accepted renewal duration override.
    #[must_use]
    pub fn max_override_months(mut self, months: u32) -> Self {
        self.max_override_months = months;
        self
    }

    /// Set the maximum note/reason length.
    #[must_use]
    pub fn max_note_length(mut self, length: usize) -> Self {
        self.max_note_length = length;
        self
    }
}
