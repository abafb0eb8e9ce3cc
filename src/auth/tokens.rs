//! Signing and verification of access and refresh tokens.
//!
//! Both token kinds are HS256 JWTs, each signed with its own secret so a
//! leaked access key cannot mint refresh tokens (and vice versa).
//! Access tokens expire after `access_token_age` seconds. Refresh tokens
//! carry no expiry: their validity is decided by the ledger.

use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Claims embedded in both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub id: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Stateless token signer. Cheap to clone.
#[derive(Clone)]
pub struct TokenManager {
    access: KeyPair,
    refresh: KeyPair,
    access_token_age: i64,
}

impl TokenManager {
    pub fn new(access_secret: &str, refresh_secret: &str, access_token_age: i64) -> Self {
        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            access_token_age,
        }
    }

    pub fn generate_access_token(&self, user_id: &str) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let claims = TokenClaims {
            id: user_id.to_string(),
            iat,
            exp: Some(iat + self.access_token_age),
            jti: None,
        };
        sign(&claims, &self.access.encoding)
    }

    pub fn generate_refresh_token(&self, user_id: &str) -> AppResult<String> {
        let claims = TokenClaims {
            id: user_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: None,
            // Two logins within the same second must still produce distinct ledger rows.
            jti: Some(Uuid::new_v4().simple().to_string()),
        };
        sign(&claims, &self.refresh.encoding)
    }

    /// Verify a refresh token's signature and structure.
    pub fn verify_refresh_token(&self, token: &str) -> AppResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        verify(token, &self.refresh.decoding, &validation)
    }

    /// Verify an access token's signature, structure and expiry.
    pub fn verify_access_token(&self, token: &str) -> AppResult<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);
        verify(token, &self.access.decoding, &validation)
    }
}

fn sign(claims: &TokenClaims, key: &EncodingKey) -> AppResult<String> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {}", e)))
}

fn verify(token: &str, key: &DecodingKey, validation: &Validation) -> AppResult<TokenClaims> {
    decode::<TokenClaims>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            AppError::InvalidToken
        })
}
