use std::collections::HashMap;

/// The main error type for Fitsuite services
#[derive(Debug, thiserror::Error)]
pub enum FitsuiteError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl FitsuiteError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a client error (bad input, missing resource).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::BadRequest(_))
    }

    /// Check if this error is safe to retry from a fresh read.
    ///
    /// Conflicts are retryable because they indicate the caller lost a race,
    /// not that the request itself was invalid.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns a safe error message suitable for client responses.
    ///
    /// Client errors return the actual message since the caller needs to know
    /// what went wrong. Internal errors return a generic message; the details
    /// belong in server-side logs, not in responses.
    #[must_use]
    pub fn safe_message(&self) -> String {
        match self {
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Conflict(msg) => format!("Conflict: {}", msg),
            Self::Internal(_) | Self::Anyhow(_) => "Internal error".to_string(),
        }
    }
}

/// Error context for additional error information
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: Option<String>,
    /// Additional error details
    pub details: Option<String>,
    /// Contextual key-value pairs
    pub context: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_id(mut self, id: impl Into<String>) -> Self {
        self.error_id = Some(id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details = Some(detail.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error with attached context
///
/// Allows attaching context to a `FitsuiteError` while still being usable as
/// a `FitsuiteError` via the `Into` trait.
#[derive(Debug)]
pub struct ErrorWithContext {
    error: FitsuiteError,
    context: ErrorContext,
}

impl ErrorWithContext {
    /// Create a new error with context
    pub fn new(error: FitsuiteError, context: ErrorContext) -> Self {
        Self { error, context }
    }

    /// Get a reference to the underlying error
    pub fn error(&self) -> &FitsuiteError {
        &self.error
    }

    /// Get a reference to the context
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }
}

impl std::fmt::Display for ErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(ref details) = self.context.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorWithContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ErrorWithContext> for FitsuiteError {
    fn from(err: ErrorWithContext) -> Self {
        err.error
    }
}

impl FitsuiteError {
    /// Add context to this error, returning an `ErrorWithContext`.
    pub fn with_context(self, context: ErrorContext) -> ErrorWithContext {
        ErrorWithContext::new(self, context)
    }
}

impl From<serde_json::Error> for FitsuiteError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            FitsuiteError::BadRequest(format!("JSON error: {}", err))
        } else {
            FitsuiteError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

/// Result type alias for Fitsuite operations
pub type Result<T> = std::result::Result<T, FitsuiteError>;
