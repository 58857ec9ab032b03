use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Invalid sort value: {value}")]
    InvalidSort { value: String, accepted: Vec<String> },

    #[error("Invalid {field}: {message}")]
    InvalidRange { field: &'static str, message: String },
}

impl FilterError {
    /// Query parameter the error is reported against
    pub fn field(&self) -> &'static str {
        match self {
            FilterError::InvalidPage(_) => "page",
            FilterError::InvalidPageSize(_) => "page_size",
            FilterError::InvalidSort { .. } => "sort",
            FilterError::InvalidRange { field, .. } => *field,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FilterError::InvalidPage(msg) | FilterError::InvalidPageSize(msg) => msg.clone(),
            FilterError::InvalidSort { value, accepted } => {
                format!("invalid sort value '{}', expected one of: {}", value, accepted.join(", "))
            }
            FilterError::InvalidRange { message, .. } => message.clone(),
        }
    }
}

/// Every problem found in one listing request
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid listing parameters: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct InvalidFilters(pub Vec<FilterError>);
