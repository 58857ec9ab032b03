use std::collections::HashMap;
use thiserror::Error;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::filter::InvalidFilters;

/// Failures of domain operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { message: String, field_errors: HashMap<String, String> },

    #[error(transparent)]
    Filters(#[from] InvalidFilters),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation { message: "Validation failed".to_string(), field_errors }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::validation(HashMap::from([(field.to_string(), message.into())]))
    }
}
