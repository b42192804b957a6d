//! Orchestration error taxonomy.
//!
//! Every error a caller of the core can observe is represented here, with
//! one variant per row of the documented error taxonomy. Callers map a
//! variant to an HTTP status via [`CoreError::status_code`] rather than
//! string-matching messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("trace not found")]
    NotFound,

    #[error("estimated cost exceeds budget")]
    BudgetExceeded,

    #[error("Mission blocked by safety system")]
    SafetyBlocked,

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream call failed: {0}")]
    UpstreamFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The HTTP status this error maps to, per the documented error table.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound => 404,
            Self::BudgetExceeded => 402,
            Self::SafetyBlocked => 403,
            Self::RateLimited { .. } => 429,
            Self::UpstreamFailed(_) => 500,
            Self::Cancelled => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::BudgetExceeded => "BUDGET_EXCEEDED",
            Self::SafetyBlocked => "SAFETY_BLOCKED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::UpstreamFailed(_) => "UPSTREAM_FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(CoreError::Validation("x".into()).status_code(), 400);
        assert_eq!(CoreError::NotFound.status_code(), 404);
        assert_eq!(CoreError::BudgetExceeded.status_code(), 402);
        assert_eq!(CoreError::SafetyBlocked.status_code(), 403);
        assert_eq!(
            CoreError::RateLimited { retry_after_secs: 1 }.status_code(),
            429
        );
        assert_eq!(CoreError::UpstreamFailed("x".into()).status_code(), 500);
    }
}
