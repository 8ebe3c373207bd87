use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use sea_orm::DbErr;

use super::{CloneError, ImportExportError};
use crate::common::db_errors::{format_db_error, DbErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unavailable,
    Internal,
}

#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let entity = entity.into();
        let id = id.into();
        let message = format!("{} {} not found", entity, id);

        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity);
        fields.insert("id".to_string(), id);

        Self {
            kind: CoreErrorKind::NotFound,
            message,
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    /// Validation failure attributed to one input field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(message).with_field("field", field)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }

    /// Wrap a database error with the operation that produced it.
    pub fn from_db(operation: &str, err: DbErr) -> Self {
        let (db_kind, message) = format_db_error(operation, &err);
        let kind = match db_kind {
            DbErrorKind::NotFound => CoreErrorKind::NotFound,
            DbErrorKind::UniqueViolation => CoreErrorKind::Conflict,
            DbErrorKind::ForeignKeyViolation => CoreErrorKind::Validation,
            DbErrorKind::ConnectionError | DbErrorKind::Timeout | DbErrorKind::Deadlock => {
                CoreErrorKind::Unavailable
            }
            DbErrorKind::Unknown => CoreErrorKind::Internal,
        };
        Self::new(kind, message).with_source(err)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        let mut core = CoreError::internal("Unhandled error");
        core.source = Some(err.into());
        core
    }
}

impl From<DbErr> for CoreError {
    fn from(err: DbErr) -> Self {
        CoreError::from_db("database operation", err)
    }
}

impl From<CloneError> for CoreError {
    fn from(err: CloneError) -> Self {
        let kind = if err.is_not_found() {
            CoreErrorKind::NotFound
        } else if err.is_client_error() {
            CoreErrorKind::Validation
        } else {
            CoreErrorKind::Internal
        };

        let mut fields = BTreeMap::new();
        fields.insert("code".to_string(), err.error_code().to_string());
        if let Some((level, source_id)) = err.location() {
            fields.insert("level".to_string(), level.to_string());
            fields.insert("sourceId".to_string(), source_id.to_string());
        }

        CoreError::new(kind, err.to_string())
            .with_fields(fields)
            .with_source(err)
    }
}

impl From<ImportExportError> for CoreError {
    fn from(err: ImportExportError) -> Self {
        let kind = if err.is_not_found() {
            CoreErrorKind::NotFound
        } else if err.is_client_error() {
            CoreErrorKind::Validation
        } else {
            CoreErrorKind::Internal
        };

        CoreError::new(kind, err.to_string())
            .with_field("code", err.error_code())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::Level;

    #[test]
    fn test_not_found_fields() {
        let err = CoreError::not_found("Category", "12");
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        assert_eq!(err.message(), "Category 12 not found");
        let fields = err.fields().unwrap();
        assert_eq!(fields.get("entity").map(String::as_str), Some("Category"));
    }

    #[test]
    fn test_clone_error_keeps_location() {
        let err: CoreError = CloneError::Integrity {
            level: Level::Topic,
            source_id: 5,
            detail: "category 9 was not cloned".to_string(),
        }
        .into();

        assert_eq!(err.kind(), CoreErrorKind::Internal);
        let fields = err.fields().unwrap();
        assert_eq!(fields.get("level").map(String::as_str), Some("topic"));
        assert_eq!(fields.get("sourceId").map(String::as_str), Some("5"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_clone_precondition_mapping() {
        let missing: CoreError = CloneError::DestinationNotFound(4).into();
        assert_eq!(missing.kind(), CoreErrorKind::NotFound);

        let same: CoreError = CloneError::SameContainer(4).into();
        assert_eq!(same.kind(), CoreErrorKind::Validation);
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err: CoreError = DbErr::RecordNotFound("topic".to_string()).into();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }
}
