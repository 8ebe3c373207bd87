//! Errors raised while cloning a container's structure tree.

use sea_orm::DbErr;
use thiserror::Error;

use crate::database::entities::Level;

#[derive(Error, Debug)]
pub enum CloneError {
    /// Source container does not exist
    #[error("Source container {0} not found")]
    SourceNotFound(i32),

    /// Destination container does not exist
    #[error("Destination container {0} not found")]
    DestinationNotFound(i32),

    /// Source and destination are the same container
    #[error("Cannot clone container {0} into itself")]
    SameContainer(i32),

    /// A required reference could not be resolved; the whole clone is aborted
    #[error("Integrity violation at {level} {source_id}: {detail}")]
    Integrity {
        level: Level,
        source_id: i32,
        detail: String,
    },

    /// Inserting the copy of a source row failed
    #[error("Failed to clone {level} {source_id}")]
    RowFailed {
        level: Level,
        source_id: i32,
        #[source]
        source: DbErr,
    },

    /// A source id was recorded twice for the same level
    #[error("Mapping for {level} {source_id} already recorded")]
    DuplicateMapping { level: Level, source_id: i32 },

    /// A level was resolved before it was fully cloned
    #[error("Cannot resolve {level} references before the {level} level is complete")]
    OutOfOrder { level: Level },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl CloneError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(self, CloneError::SameContainer(_))
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CloneError::SourceNotFound(_) | CloneError::DestinationNotFound(_)
        )
    }

    /// Precondition failures are detected before any write happens.
    pub fn is_precondition(&self) -> bool {
        self.is_client_error() || self.is_not_found()
    }

    /// Remapper or orchestration misuse; a bug, never caused by data.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            CloneError::DuplicateMapping { .. } | CloneError::OutOfOrder { .. }
        )
    }

    pub fn level(&self) -> Option<Level> {
        match self {
            CloneError::OutOfOrder { level } => Some(*level),
            _ => self.location().map(|(level, _)| level),
        }
    }

    pub fn source_id(&self) -> Option<i32> {
        self.location().map(|(_, source_id)| source_id)
    }

    /// Level and source row a failure is attributed to, if any.
    pub fn location(&self) -> Option<(Level, i32)> {
        match self {
            CloneError::Integrity {
                level, source_id, ..
            }
            | CloneError::RowFailed {
                level, source_id, ..
            }
            | CloneError::DuplicateMapping { level, source_id } => Some((*level, *source_id)),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CloneError::SourceNotFound(_) => "CLONE_SOURCE_NOT_FOUND",
            CloneError::DestinationNotFound(_) => "CLONE_DESTINATION_NOT_FOUND",
            CloneError::SameContainer(_) => "CLONE_SAME_CONTAINER",
            CloneError::Integrity { .. } => "CLONE_INTEGRITY_VIOLATION",
            CloneError::RowFailed { .. } => "CLONE_ROW_FAILED",
            CloneError::DuplicateMapping { .. } => "CLONE_DUPLICATE_MAPPING",
            CloneError::OutOfOrder { .. } => "CLONE_OUT_OF_ORDER",
            CloneError::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors() {
        assert!(CloneError::SourceNotFound(1).is_not_found());
        assert!(CloneError::DestinationNotFound(2).is_precondition());
        assert!(CloneError::SameContainer(3).is_client_error());
        assert!(!CloneError::OutOfOrder {
            level: Level::Topic
        }
        .is_precondition());
    }

    #[test]
    fn test_location_reports_level_and_row() {
        let err = CloneError::Integrity {
            level: Level::Factor,
            source_id: 42,
            detail: "topic 7 was not cloned".to_string(),
        };
        assert_eq!(err.location(), Some((Level::Factor, 42)));
        assert_eq!(err.error_code(), "CLONE_INTEGRITY_VIOLATION");
        assert!(err.to_string().contains("factor 42"));
        assert_eq!(CloneError::SameContainer(1).location(), None);
    }

    #[test]
    fn test_misuse_errors() {
        let err = CloneError::OutOfOrder {
            level: Level::Category,
        };
        assert!(err.is_misuse());
        assert_eq!(err.level(), Some(Level::Category));
        assert_eq!(err.source_id(), None);

        let dup = CloneError::DuplicateMapping {
            level: Level::Topic,
            source_id: 8,
        };
        assert!(dup.is_misuse());
        assert_eq!(dup.source_id(), Some(8));
    }
}
