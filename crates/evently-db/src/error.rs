//! Storage error type.

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Event {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound(id.to_string())
    }

    pub fn name_not_found(name: &str) -> Self {
        Self::NotFound(format!("named `{name}`"))
    }

    pub fn ambiguous_name(name: &str) -> Self {
        Self::Conflict(format!("More than one event is named `{name}`"))
    }
}

/// Maps constraint violations to their own variants.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(db_err.message().to_owned());
        }
        // 22001: string_data_right_truncation, 23514: check_violation
        if matches!(db_err.code().as_deref(), Some("22001") | Some("23514")) {
            return StoreError::Validation(db_err.message().to_owned());
        }
    }
    StoreError::Database(err)
}
