//! Mapping of admin errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use crate::domain::AdminError;

/// Body text of every 404 response.
pub const NOT_FOUND_MESSAGE: &str = "The requested page does not exist.";

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { entity, id } => {
                debug!(%entity, %id, "Responding 404");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": NOT_FOUND_MESSAGE })),
                )
                    .into_response()
            }
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "validation failed", "errors": errors })),
            )
                .into_response(),
            Self::Storage(e) => {
                error!(error = %format!("{e:#}"), "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, ValidationError};

    #[test]
    fn test_status_codes() {
        let response = AdminError::not_found(Entity::Order, 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            AdminError::Validation(vec![ValidationError::new("amount", "bad")]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = AdminError::Storage(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
