//! Database error categorization and message formatting
//!
//! ```rust
//! use assessment::common::db_errors::*;
//! use sea_orm::DbErr;
//!
//! let err = DbErr::RecordNotFound("Topic not found".to_string());
//! let (kind, message) = format_db_error("find topic", &err);
//! assert_eq!(kind, DbErrorKind::NotFound);
//! assert_eq!(message, "find topic: record not found");
//! ```

use sea_orm::{ConnAcquireErr, DbErr};

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Query returned no results (404)
    NotFound,

    /// Unique constraint violation (409)
    UniqueViolation,

    /// Foreign key constraint violation (400)
    ForeignKeyViolation,

    /// Database connection error (503)
    ConnectionError,

    /// Query or pool acquire timeout (503)
    Timeout,

    /// Database locked or deadlocked (503, retry)
    Deadlock,

    /// Anything else (500)
    Unknown,
}

impl DbErrorKind {
    /// Categorize a sea_orm database error
    pub fn from_db_err(err: &DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => Self::Timeout,
            DbErr::ConnectionAcquire(_) => Self::ConnectionError,
            DbErr::Conn(inner) if inner.to_string().to_lowercase().contains("timeout") => {
                Self::Timeout
            }
            DbErr::Conn(_) => Self::ConnectionError,
            DbErr::Exec(_) | DbErr::Query(_) => {
                let msg_lower = err.to_string().to_lowercase();
                if msg_lower.contains("unique") || msg_lower.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg_lower.contains("foreign key") || msg_lower.contains("fk_") {
                    Self::ForeignKeyViolation
                } else if msg_lower.contains("deadlock") || msg_lower.contains("database is locked")
                {
                    Self::Deadlock
                } else if msg_lower.contains("timeout") {
                    Self::Timeout
                } else {
                    Self::Unknown
                }
            }
            _ => Self::Unknown,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UniqueViolation => 409,
            Self::ForeignKeyViolation => 400,
            Self::ConnectionError | Self::Timeout | Self::Deadlock => 503,
            Self::Unknown => 500,
        }
    }

    /// Transient errors that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout | Self::Deadlock)
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::UniqueViolation | Self::ForeignKeyViolation
        )
    }
}

/// Format database error with operation context
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);

    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        DbErrorKind::UniqueViolation => format!("{}: duplicate key violation", operation),
        DbErrorKind::ForeignKeyViolation => {
            format!("{}: foreign key constraint violation", operation)
        }
        DbErrorKind::ConnectionError => format!("{}: database connection failed", operation),
        DbErrorKind::Timeout => format!("{}: query timeout", operation),
        DbErrorKind::Deadlock => format!("{}: database busy", operation),
        DbErrorKind::Unknown => format!("{}: database error - {}", operation, err),
    };

    (kind, message)
}
