use std::time::Duration;
use thiserror::Error;

/// Cross-component error taxonomy. Every repository/service function in the
/// engine returns one of these kinds so the HTTP boundary (`engagement-api`)
/// can map them to status codes without re-deriving intent from a string.
/// Generalizes `icn_governance::voting::VotingError` and
/// `icn_eventstore`'s `CommonError::{DatabaseError,SerializationError,...}`
/// into one enum shared by every crate instead of one per crate.
#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("unique constraint violated: {0}")]
    UniqueConstraint(String),

    #[error("visibility denied")]
    VisibilityDenied,

    #[error("capacity exceeded")]
    CapacityExceeded,

    #[error("waitlist disabled")]
    WaitlistDisabled,

    #[error("values mismatch: {0}")]
    ValuesMismatch(String),

    #[error("dealbreaker: {0}")]
    Dealbreaker(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("transient store error: {0}")]
    Transient(String),

    #[error("invariant violation: {0}")]
    Fatal(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EngagementError {
    /// `VisibilityDenied` never reveals *why* a caller was denied access,
    /// "never reveals whether a hidden resource exists."
    pub fn visibility_denied() -> Self {
        Self::VisibilityDenied
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Wraps a lower-level error with short context, mirroring the
    /// teacher's `"failed to create adventure: {0}"`-style wrapping.
    pub fn context(self, msg: &str) -> Self {
        match self {
            Self::NotFound(e) => Self::NotFound(format!("{msg}: {e}")),
            Self::Transient(e) => Self::Transient(format!("{msg}: {e}")),
            Self::Fatal(e) => Self::Fatal(format!("{msg}: {e}")),
            other => other,
        }
    }

    /// True for errors the handler layer should retry (up to
    /// 3x with jitter).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
