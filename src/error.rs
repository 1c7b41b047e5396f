//! Unified error hierarchy for trainready
//!
//! Every failure the engine can report maps onto one of these types. The
//! dispatcher turns them into `{ "error": message }` bodies with a 400 or 500
//! status; absence of history is never an error.

use thiserror::Error;

/// Top-level error type for all trainready operations
#[derive(Debug, Error)]
pub enum TrainReadyError {
    /// Payload field failed its contract
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Request body could not be interpreted at all
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `user_id` absent or blank
    #[error("user_id is required")]
    MissingUserId,

    /// `action` absent
    #[error("action is required (expected one of: submit_doms, log_session, get_suggestion)")]
    MissingAction,

    /// Action outside the supported set
    #[error("Unknown action: {0} (expected one of: submit_doms, log_session, get_suggestion)")]
    UnknownAction(String),

    /// Persistence collaborator failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Response body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Field-level validation failures, each naming the offending field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Scaled field outside its inclusive range
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: String,
    },

    /// Required field not present in the payload
    #[error("{field} is required")]
    MissingField { field: String },

    /// Field present but not of the expected type
    #[error("{field} must be {expected}")]
    WrongType { field: String, expected: String },

    /// Field must be strictly positive
    #[error("{field} must be greater than 0")]
    NotPositive { field: String },

    /// Field must be zero or more
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Unparseable calendar date
    #[error("{field} must be a date in YYYY-MM-DD format (got {value})")]
    InvalidDate { field: String, value: String },

    /// Value too large for the load arithmetic
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Blank string where content is required
    #[error("{field} must not be empty")]
    Empty { field: String },
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Row could not be mapped back into a record
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Lock held by a thread that panicked
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type alias for trainready operations
pub type Result<T> = std::result::Result<T, TrainReadyError>;

impl TrainReadyError {
    /// HTTP-equivalent status for this error
    pub fn status_code(&self) -> u16 {
        match self {
            TrainReadyError::Store(_)
            | TrainReadyError::Configuration(_)
            | TrainReadyError::Serialization(_) => 500,
            _ => 400,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrainReadyError::Validation(_)
            | TrainReadyError::InvalidRequest(_)
            | TrainReadyError::MissingUserId
            | TrainReadyError::MissingAction
            | TrainReadyError::UnknownAction(_) => ErrorSeverity::Warning,
            TrainReadyError::Store(StoreError::Poisoned) => ErrorSeverity::Critical,
            TrainReadyError::Store(_) => ErrorSeverity::Error,
            TrainReadyError::Configuration(_) | TrainReadyError::Serialization(_) => {
                ErrorSeverity::Error
            }
        }
    }

    /// Message safe to hand back to the caller
    pub fn user_message(&self) -> String {
        match self {
            TrainReadyError::Store(_) => {
                "Internal error: the training store is unavailable".to_string()
            }
            TrainReadyError::Configuration(_) => "Internal error: misconfigured engine".to_string(),
            TrainReadyError::Serialization(_) => {
                "Internal error: response could not be encoded".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Caller-correctable problem
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field_and_range() {
        let err = TrainReadyError::from(ValidationError::OutOfRange {
            field: "sleep_quality".to_string(),
            min: 1,
            max: 10,
            value: "0".to_string(),
        });
        assert_eq!(err.to_string(), "sleep_quality must be between 1 and 10 (got 0)");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_store_errors_are_generic_to_callers() {
        let err = TrainReadyError::Store(StoreError::Corrupt("bad date".to_string()));
        assert_eq!(err.status_code(), 500);
        assert!(!err.user_message().contains("bad date"));
    }

    #[test]
    fn test_unknown_action_names_action() {
        let err = TrainReadyError::UnknownAction("dance".to_string());
        assert!(err.user_message().contains("dance"));
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }
}
