use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::password::hash_password;
use crate::errors::{AppError, AppResult};
use crate::models::new_id;
use crate::models::user::NewUser;

/// Relational access to the `users` table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    async fn insert_user(&self, user: &NewUser) -> AppResult<Option<String>>;
}

#[derive(Clone)]
pub struct UserRegistry {
    directory: Arc<dyn UserDirectory>,
}

impl UserRegistry {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Create a user and return its id. Usernames are unique.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        fullname: &str,
    ) -> AppResult<String> {
        if self.directory.username_exists(username).await? {
            return Err(AppError::Validation("username already taken".into()));
        }

        let user = NewUser {
            id: new_id("user"),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            fullname: fullname.to_string(),
        };

        let id = self
            .directory
            .insert_user(&user)
            .await?
            .ok_or_else(|| AppError::PersistenceCheckFailed("user could not be added".into()))?;

        tracing::info!(user_id = %id, username = %username, "user registered");
        Ok(id)
    }
}
