use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use credentials::CredentialError;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServiceError::Store(_) | ServiceError::Credentials(_) | ServiceError::Internal(_) => {
                tracing::error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ServiceError::NotFound("User not found.").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_400() {
        let response = ServiceError::Validation("Email is required.".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_are_500() {
        let response = ServiceError::Store(StoreError::Connection("refused".to_string())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
