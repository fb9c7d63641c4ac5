use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("storage error: {message}")]
    Storage {
        message: String,
        details: Option<JsonValue>,
    },
    #[error("not found: {message}")]
    NotFound {
        message: String,
        details: Option<JsonValue>,
    },
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        details: Option<JsonValue>,
    },
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        details: Option<JsonValue>,
    },
}

impl CatalogError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details: None,
        }
    }

    /// Stable machine-readable code; HTTP layers map these 1:1 onto statuses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "storage",
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Conflict { .. } => "conflict",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Storage { message, .. }
            | Self::NotFound { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Conflict { message, .. } => message,
        }
    }

    pub fn with_details(mut self, value: JsonValue) -> Self {
        match &mut self {
            Self::Storage { details, .. }
            | Self::NotFound { details, .. }
            | Self::InvalidInput { details, .. }
            | Self::Conflict { details, .. } => *details = Some(value),
        }
        self
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<sea_orm::DbErr> for CatalogError {
    fn from(value: sea_orm::DbErr) -> Self {
        match value.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(message)) => {
                CatalogError::conflict(message)
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(message)) => {
                CatalogError::conflict(message)
            }
            _ => CatalogError::storage(value.to_string()),
        }
    }
}
