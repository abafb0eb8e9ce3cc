use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::state::AppState;

/// Authenticated caller, resolved from `Authorization: Bearer <accessToken>`.
///
/// Access tokens are never persisted: a valid signature and an unexpired
/// `exp` are all that is checked.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let claims = state
            .tokens
            .verify_access_token(token)
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(AuthUser { id: claims.id })
    }
}
