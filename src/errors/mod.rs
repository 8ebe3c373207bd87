//! Error types for the assessment structure backend.
//!
//! - **CoreError**: service-level error carried to the HTTP layer
//! - **CloneError**: structure cloning failures and remapper misuse
//! - **ImportExportError**: spreadsheet export/import failures

pub mod clone;
pub mod core_error;
pub mod import_export;

pub use clone::CloneError;
pub use core_error::{CoreError, CoreErrorKind};
pub use import_export::ImportExportError;

/// Result type alias for service operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for cloning operations
pub type CloneResult<T> = Result<T, CloneError>;

/// Result type alias for spreadsheet operations
pub type ImportExportResult<T> = Result<T, ImportExportError>;
