use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::errors::{CoreError, CoreErrorKind};

/// Error fields that may be shown to API clients.
const PUBLIC_FIELDS: [&str; 6] = ["code", "entity", "field", "id", "level", "sourceId"];

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, error) = match self.kind() {
            CoreErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            CoreErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation_failed"),
            CoreErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
            CoreErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            CoreErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let mut fields = Map::new();
        if let Some(all) = self.fields() {
            for (key, value) in all {
                if PUBLIC_FIELDS.contains(&key.as_str()) {
                    fields.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }

        // Clone failures name the level and row; other internal errors stay opaque.
        let attributed = fields
            .get("code")
            .and_then(Value::as_str)
            .map_or(false, |code| code.starts_with("CLONE_"));
        let message = if status.is_server_error() && !attributed {
            "Internal server error".to_string()
        } else {
            self.message().to_string()
        };

        if status.is_server_error() {
            tracing::error!("{} (source: {:?})", self, std::error::Error::source(&self).map(|s| s.to_string()));
        }

        let body = json!({
            "error": error,
            "message": message,
            "fields": fields,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::Level;
    use crate::errors::CloneError;

    #[test]
    fn test_status_mapping() {
        let response = CoreError::not_found("container", "3").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CoreError::invalid_field("name", "empty").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = CoreError::unavailable("db down").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_clone_integrity_is_server_error() {
        let err: CoreError = CloneError::Integrity {
            level: Level::Factor,
            source_id: 4,
            detail: "topic 9 is not part of the source container".to_string(),
        }
        .into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
