//! Spreadsheet export and import errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportExportError {
    /// Workbook could not be written
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Workbook could not be opened or read
    #[error("Import failed: {0}")]
    ImportFailed(String),

    /// Workbook opened but does not have the expected layout
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// Target container does not exist
    #[error("Container {0} not found")]
    ContainerNotFound(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ImportExportError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportExportError::ImportFailed(_) | ImportExportError::InvalidFormat(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportExportError::ContainerNotFound(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ImportExportError::ExportFailed(_) => "EXPORT_FAILED",
            ImportExportError::ImportFailed(_) => "IMPORT_FAILED",
            ImportExportError::InvalidFormat(_) => "INVALID_FORMAT",
            ImportExportError::ContainerNotFound(_) => "CONTAINER_NOT_FOUND",
            ImportExportError::Io(_) => "IO_ERROR",
            ImportExportError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportExportError::ExportFailed(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportExportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportExportError::ImportFailed(err.to_string())
    }
}

impl From<zip::result::ZipError> for ImportExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportExportError::ImportFailed(format!("Failed to read XLSX archive: {}", err))
    }
}

impl From<quick_xml::Error> for ImportExportError {
    fn from(err: quick_xml::Error) -> Self {
        ImportExportError::InvalidFormat(format!("Malformed shared strings: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(ImportExportError::InvalidFormat("x".into()).is_client_error());
        assert!(ImportExportError::ContainerNotFound(9).is_not_found());
        assert!(!ImportExportError::ExportFailed("x".into()).is_client_error());
    }
}
