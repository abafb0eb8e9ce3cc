use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("refresh token not recognized")]
    TokenNotRecognized,

    #[error("missing or invalid access token")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("persistence check failed: {0}")]
    PersistenceCheckFailed(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status code the request boundary answers with for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidToken
            | AppError::TokenNotRecognized
            | AppError::PersistenceCheckFailed(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Persistence(_)
            | AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, msg) = match &self {
            AppError::Validation(reason) => ("validation_failed", reason.clone()),
            AppError::InvalidCredentials => (
                "invalid_credentials",
                "the credentials you provided are wrong".to_string(),
            ),
            AppError::InvalidToken => ("invalid_token", "refresh token is invalid".to_string()),
            AppError::TokenNotRecognized => (
                "token_not_recognized",
                "refresh token is not recognized".to_string(),
            ),
            AppError::Unauthenticated => (
                "unauthenticated",
                "invalid or missing access token".to_string(),
            ),
            AppError::NotFound(what) => ("not_found", what.clone()),
            AppError::Forbidden(reason) => ("forbidden", reason.clone()),
            AppError::PersistenceCheckFailed(reason) => {
                ("persistence_check_failed", reason.clone())
            }
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {}", e);
                ("internal_server_error", "internal server error".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ("internal_server_error", "internal server error".to_string())
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                ("internal_server_error", "internal server error".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                ("internal_server_error", "internal server error".to_string())
            }
        };

        // Client mistakes are "fail", server faults are "error".
        let outcome = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };

        let body = Json(json!({
            "status": outcome,
            "message": msg,
            "code": code,
        }));

        let mut response = (status, body).into_response();

        if matches!(self, AppError::Unauthenticated) {
            response.headers_mut().insert(
                "www-authenticate",
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_are_client_errors() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TokenNotRecognized.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_playlist_errors_map_to_404_and_403() {
        assert_eq!(
            AppError::NotFound("playlist not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("not yours".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::PersistenceCheckFailed("no id".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unauthenticated_sets_challenge_header() {
        let resp = AppError::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get("www-authenticate").unwrap(), "Bearer");
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_are_reported_as_fail() {
        let (status, body) = body_of(AppError::Forbidden("not yours".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({"status": "fail", "message": "not yours", "code": "forbidden"})
        );
    }

    #[tokio::test]
    async fn test_server_errors_are_reported_as_error_without_details() {
        let (status, body) = body_of(AppError::Persistence("duplicate key value".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "internal server error");
    }
}
