use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::password::verify_password;
use crate::errors::{AppError, AppResult};
use crate::models::playlist::PlaylistSummary;
use crate::models::user::{NewUser, UserCredential};
use crate::services::{
    CollaborationOracle, CredentialVerifier, PlaylistRepository, RefreshTokenLedger, UserDirectory,
};

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}

// -- Users --

#[async_trait]
impl UserDirectory for PgStore {
    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            "INSERT INTO users (id, username, password, fullname)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.fullname)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration of the same username.
            if is_unique_violation(&e) {
                AppError::Validation("username already taken".into())
            } else {
                AppError::Database(e)
            }
        })?;
        Ok(id)
    }
}

#[async_trait]
impl CredentialVerifier for PgStore {
    async fn verify_credentials(&self, username: &str, password: &str) -> AppResult<String> {
        let row = sqlx::query_as::<_, UserCredential>(
            "SELECT id, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = row else {
            return Err(AppError::InvalidCredentials);
        };

        if verify_password(password, &user.password)? {
            Ok(user.id)
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

// -- Refresh token ledger --

#[async_trait]
impl RefreshTokenLedger for PgStore {
    async fn add_refresh_token(&self, token: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO authentications (token) VALUES ($1)")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("failed to store refresh token: {}", e)))?;
        Ok(())
    }

    async fn contains_refresh_token(&self, token: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM authentications WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn delete_refresh_token(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authentications WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Playlists --

#[async_trait]
impl PlaylistRepository for PgStore {
    async fn insert_playlist(
        &self,
        id: &str,
        name: &str,
        owner: &str,
    ) -> AppResult<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            "INSERT INTO playlists (id, name, owner) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(id)
        .bind(name)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn playlists_visible_to(&self, user_id: &str) -> AppResult<Vec<PlaylistSummary>> {
        // EXISTS rather than a join so a playlist with several collaborators is listed once.
        let rows = sqlx::query_as::<_, PlaylistSummary>(
            r#"SELECT playlists.id, playlists.name, users.username
               FROM playlists
               JOIN users ON users.id = playlists.owner
               WHERE playlists.owner = $1
                  OR EXISTS (
                      SELECT 1 FROM collaborations
                      WHERE collaborations.playlist_id = playlists.id
                        AND collaborations.user_id = $1
                  )
               ORDER BY playlists.name ASC, playlists.id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_playlist(&self, id: &str) -> AppResult<Option<PlaylistSummary>> {
        let row = sqlx::query_as::<_, PlaylistSummary>(
            r#"SELECT playlists.id, playlists.name, users.username
               FROM playlists
               JOIN users ON users.id = playlists.owner
               WHERE playlists.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn playlist_owner(&self, id: &str) -> AppResult<Option<String>> {
        let owner = sqlx::query_scalar::<_, String>("SELECT owner FROM playlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn delete_playlist(&self, id: &str) -> AppResult<Option<String>> {
        let owner =
            sqlx::query_scalar::<_, String>("DELETE FROM playlists WHERE id = $1 RETURNING owner")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(owner)
    }
}

// -- Collaborations --

#[async_trait]
impl CollaborationOracle for PgStore {
    async fn verify_collaborator(&self, playlist_id: &str, user_id: &str) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM collaborations WHERE playlist_id = $1 AND user_id = $2)",
        )
        .bind(playlist_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::Forbidden("collaboration not found".into()))
        }
    }
}
