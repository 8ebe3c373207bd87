use serde_json::Value;

use crate::errors::{CoreError, CoreResult};

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;
pub const MIN_ASSESSMENT_YEAR: i32 = 1900;
pub const MAX_ASSESSMENT_YEAR: i32 = 2100;

/// Answer widgets a content item can be rendered with.
pub const ANSWER_TYPES: [&str; 9] = [
    "text",
    "textarea",
    "number",
    "date",
    "select",
    "multiselect",
    "radio",
    "checkbox",
    "scale",
];

/// Field validation and normalisation shared by all services
pub struct ValidationService;

impl ValidationService {
    /// Trimmed, non-empty name of at most 255 characters
    pub fn validate_name(field: &str, name: &str) -> CoreResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(CoreError::invalid_field(
                field,
                format!("{} cannot be empty", field),
            ));
        }

        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(CoreError::invalid_field(
                field,
                format!("{} is too long (max {} characters)", field, MAX_NAME_LENGTH),
            ));
        }

        Ok(trimmed.to_string())
    }

    /// Optional long text; blank values are stored as NULL
    pub fn validate_text(field: &str, text: Option<String>) -> CoreResult<Option<String>> {
        let Some(text) = text else {
            return Ok(None);
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(CoreError::invalid_field(
                field,
                format!(
                    "{} is too long (max {} characters)",
                    field, MAX_DESCRIPTION_LENGTH
                ),
            ));
        }

        Ok(Some(trimmed.to_string()))
    }

    pub fn validate_answer_type(answer_type: &str) -> CoreResult<String> {
        let normalized = answer_type.trim().to_ascii_lowercase();
        if ANSWER_TYPES.contains(&normalized.as_str()) {
            Ok(normalized)
        } else {
            Err(CoreError::invalid_field(
                "answer_type",
                format!(
                    "Unknown answer type '{}' (expected one of: {})",
                    answer_type.trim(),
                    ANSWER_TYPES.join(", ")
                ),
            ))
        }
    }

    /// Answer options must be a JSON array of strings; stored as JSON text.
    pub fn validate_answer_options(options: &Value) -> CoreResult<String> {
        let Some(items) = options.as_array() else {
            return Err(CoreError::invalid_field(
                "answer_options",
                "answer_options must be a JSON array",
            ));
        };

        if items.iter().any(|item| !item.is_string()) {
            return Err(CoreError::invalid_field(
                "answer_options",
                "answer_options may only contain strings",
            ));
        }

        serde_json::to_string(options).map_err(|e| {
            CoreError::invalid_field("answer_options", format!("Invalid answer options: {}", e))
        })
    }

    pub fn validate_assessment_year(year: i32) -> CoreResult<i32> {
        if (MIN_ASSESSMENT_YEAR..=MAX_ASSESSMENT_YEAR).contains(&year) {
            Ok(year)
        } else {
            Err(CoreError::invalid_field(
                "assessment_year",
                format!(
                    "assessment_year must be between {} and {}",
                    MIN_ASSESSMENT_YEAR, MAX_ASSESSMENT_YEAR
                ),
            ))
        }
    }

    pub fn validate_display_order(order: i32) -> CoreResult<i32> {
        if order < 0 {
            return Err(CoreError::invalid_field(
                "display_order",
                "display_order cannot be negative",
            ));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;
    use serde_json::json;

    #[test]
    fn test_validate_name() {
        assert_eq!(
            ValidationService::validate_name("name", "  Governance ").unwrap(),
            "Governance"
        );

        let err = ValidationService::validate_name("name", "   ").unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
        assert_eq!(
            err.fields().and_then(|f| f.get("field")).map(String::as_str),
            Some("name")
        );

        assert!(ValidationService::validate_name("name", &"x".repeat(256)).is_err());
        assert!(ValidationService::validate_name("name", &"é".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(ValidationService::validate_text("description", None).unwrap(), None);
        assert_eq!(
            ValidationService::validate_text("description", Some("  ".into())).unwrap(),
            None
        );
        assert!(
            ValidationService::validate_text("description", Some("x".repeat(10_001))).is_err()
        );
    }

    #[test]
    fn test_validate_answer_type() {
        assert_eq!(
            ValidationService::validate_answer_type(" Select ").unwrap(),
            "select"
        );
        assert!(ValidationService::validate_answer_type("slider").is_err());
    }

    #[test]
    fn test_validate_answer_options() {
        assert_eq!(
            ValidationService::validate_answer_options(&json!(["Low", "High"])).unwrap(),
            r#"["Low","High"]"#
        );
        assert!(ValidationService::validate_answer_options(&json!({"a": 1})).is_err());
        assert!(ValidationService::validate_answer_options(&json!(["Low", 2])).is_err());
    }

    #[test]
    fn test_validate_assessment_year() {
        assert!(ValidationService::validate_assessment_year(2025).is_ok());
        assert!(ValidationService::validate_assessment_year(1899).is_err());
        assert!(ValidationService::validate_assessment_year(2101).is_err());
    }
}
