use std::time::Duration;

use common_errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sql_connection::PgError),
    #[error("Connection error: {0}")]
    Connection(#[from] sql_connection::PoolError),
    #[error("Event store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Event store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("Event store dependency failed: {0}")]
    Dependency(#[from] EventStoreError),
}

impl InsightsError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<InsightsError> for AppError {
    fn from(err: InsightsError) -> Self {
        match err {
            InsightsError::Validation { field, message } => {
                AppError::bad_request_with_details(
                    "VALIDATION_ERROR",
                    &format!("Invalid {field}: {message}"),
                    field,
                )
            }
            InsightsError::Dependency(source) => {
                tracing::error!(error = %source, "reporting dependency failed");
                AppError::service_unavailable(
                    "DEPENDENCY_UNAVAILABLE",
                    "Reporting data is temporarily unavailable, please try \
                     again shortly",
                )
            }
        }
    }
}
