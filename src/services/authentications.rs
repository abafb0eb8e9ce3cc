//! Login, token refresh and logout.
//!
//! Each call is a complete transaction; no session object is kept between
//! requests. A refresh token is only honoured while its exact string is in
//! the ledger, which is what makes server-side revocation possible.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::tokens::TokenManager;
use crate::errors::{AppError, AppResult};

/// Confirms a username/password pair and yields the user id.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Fails with `AppError::InvalidCredentials` when the pair does not match.
    async fn verify_credentials(&self, username: &str, password: &str) -> AppResult<String>;
}

/// Persistent set of currently valid refresh tokens, keyed by token string.
#[async_trait]
pub trait RefreshTokenLedger: Send + Sync {
    async fn add_refresh_token(&self, token: &str) -> AppResult<()>;

    async fn contains_refresh_token(&self, token: &str) -> AppResult<bool>;

    /// Returns `false` if no row was removed.
    async fn delete_refresh_token(&self, token: &str) -> AppResult<bool>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthenticationFlow {
    credentials: Arc<dyn CredentialVerifier>,
    ledger: Arc<dyn RefreshTokenLedger>,
    tokens: TokenManager,
}

impl AuthenticationFlow {
    pub fn new(
        credentials: Arc<dyn CredentialVerifier>,
        ledger: Arc<dyn RefreshTokenLedger>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            credentials,
            ledger,
            tokens,
        }
    }

    /// Issue an access/refresh pair and record the refresh token in the ledger.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let user_id = self.credentials.verify_credentials(username, password).await?;

        let access_token = self.tokens.generate_access_token(&user_id)?;
        let refresh_token = self.tokens.generate_refresh_token(&user_id)?;

        self.ledger.add_refresh_token(&refresh_token).await?;

        tracing::info!(user_id = %user_id, "login succeeded");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token. The refresh token itself is left untouched.
    ///
    /// Ledger presence is checked before the signature, so revoked tokens
    /// are turned away without any cryptographic work.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        self.ensure_recognized(refresh_token).await?;
        let claims = self.tokens.verify_refresh_token(refresh_token)?;

        tracing::debug!(user_id = %claims.id, "access token refreshed");
        self.tokens.generate_access_token(&claims.id)
    }

    /// Revoke a refresh token. Ledger presence alone authorizes removal.
    /// A second logout with the same token fails with `TokenNotRecognized`.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        self.ensure_recognized(refresh_token).await?;

        // A concurrent logout may have removed the row in between.
        if !self.ledger.delete_refresh_token(refresh_token).await? {
            return Err(AppError::TokenNotRecognized);
        }
        tracing::debug!("refresh token revoked");
        Ok(())
    }

    async fn ensure_recognized(&self, refresh_token: &str) -> AppResult<()> {
        if self.ledger.contains_refresh_token(refresh_token).await? {
            Ok(())
        } else {
            Err(AppError::TokenNotRecognized)
        }
    }
}
