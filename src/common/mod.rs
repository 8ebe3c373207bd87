pub mod db_errors;
pub mod rich_text;
pub mod serde_helpers;
