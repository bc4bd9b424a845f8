//! Definitions for error types used throughout core.

use crate::utils::validation::ValidationErrors;
use crate::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// database error
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// precondition failed on user input or current state, not retryable
    #[error("validation error: {0}")]
    Validation(String),

    /// requested entity is in the wrong state for the operation
    #[error("conflict: {0}")]
    Conflict(String),

    /// referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// collected field-level validation errors
    #[error("validation error: {0}")]
    Fields(#[from] ValidationErrors),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// true for error kinds the task runner should retry rather than give up on
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Db(DbError::SerializationFailure) | CoreError::Db(DbError::Other(_))
        )
    }

    /// true for the scheduler-specific failure the build task downgrades instead of retrying
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::Fields(_))
    }
}
