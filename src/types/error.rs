//! Error types for Tribunal
//!
//! Every rejection the ledger can produce is a distinct variant so the
//! presentation layer can show a specific message instead of a generic failure.

use hyper::StatusCode;
use mongodb::error::ErrorKind;

use crate::model::QuotaAction;

/// Main error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum TribunalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Daily {0} limit reached, try again tomorrow")]
    QuotaExceeded(QuotaAction),

    #[error("You have already voted on this case")]
    DuplicateVote,

    #[error("You have already commented on this case")]
    DuplicateComment,

    #[error("You must judge this case before you can comment")]
    VoteRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Pending verification: {0}")]
    Unverified(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TribunalError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::DuplicateVote => StatusCode::CONFLICT,
            Self::DuplicateComment => StatusCode::CONFLICT,
            Self::VoteRequired => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unverified(_) => StatusCode::FORBIDDEN,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::QuotaExceeded(QuotaAction::Post) => "post_quota_exceeded",
            Self::QuotaExceeded(QuotaAction::Judge) => "judge_quota_exceeded",
            Self::DuplicateVote => "duplicate_vote",
            Self::DuplicateComment => "duplicate_comment",
            Self::VoteRequired => "vote_required",
            Self::NotFound(_) => "not_found",
            Self::Unverified(_) => "unverified",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::PermissionDenied(_) => "permission_denied",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller may retry the whole operation with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.to_string();
        (status, body)
    }
}

// Server error code MongoDB returns for unauthorized commands
const MONGO_UNAUTHORIZED: i32 = 13;

impl From<mongodb::error::Error> for TribunalError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Authentication { .. } => Self::PermissionDenied(err.to_string()),
            ErrorKind::Command(cmd) if cmd.code == MONGO_UNAUTHORIZED => {
                Self::PermissionDenied(err.to_string())
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for TribunalError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encode error: {}", err))
    }
}

impl From<std::io::Error> for TribunalError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for TribunalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON error: {}", err))
    }
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, TribunalError>;
