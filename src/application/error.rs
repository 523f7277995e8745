//! Application-level errors (wraps domain and backend errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::BackendError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{}", .0.user_message())]
    Backend(#[from] BackendError),

    #[error("{operation} already in progress")]
    Busy { operation: &'static str },

    #[error("cancelled")]
    Cancelled,

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Validation and structural errors never reached the backend.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(_) | ApplicationError::Busy { .. } | ApplicationError::Cancelled
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
