//! Error types for photo-intake.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Labeler error: {0}")]
    Labeler(#[from] LabelerError),

    #[error("Board error: {0}")]
    Board(#[from] BoardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Image labeling service errors.
#[derive(Debug, thiserror::Error)]
pub enum LabelerError {
    #[error("Labeling request failed: {0}")]
    RequestFailed(String),

    #[error("Labeling service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from labeling service: {0}")]
    InvalidResponse(String),
}

/// Task board service errors.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Board request failed: {0}")]
    RequestFailed(String),

    #[error("Board service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from board service: {0}")]
    InvalidResponse(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned from HTTP handlers.
///
/// A missing row maps to 404. Everything else is a generic 500 whose body
/// carries no upstream detail; the detail goes to the log.
#[derive(Debug)]
pub struct ApiError(Error);

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Database(err @ DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn server_error_body_hides_upstream_detail() {
        let (status, body) = body_of(ApiError::from(BoardError::Api {
            status: 401,
            message: "invalid token abc123 for member me".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (_, body) = body_of(ApiError::from(DatabaseError::Query(
            "create_request: no such table: requests".into(),
        )))
        .await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn not_found_body_names_the_row() {
        let (status, body) = body_of(ApiError::from(DatabaseError::NotFound {
            entity: "request".into(),
            id: "12".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Entity not found: request with id 12");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::from(DatabaseError::NotFound {
            entity: "request".into(),
            id: "7".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failures_map_to_500() {
        let err = ApiError::from(BoardError::Api {
            status: 401,
            message: "invalid token".into(),
        });
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let err = ApiError::from(LabelerError::RequestFailed("connection refused".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
