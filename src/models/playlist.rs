use serde::{Deserialize, Serialize};

/// A playlist as listed to a user: the owner is resolved to a username.
/// This is also the shape cached under `playlists:{userId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Cache key holding every playlist visible to `user_id`.
pub fn playlists_cache_key(user_id: &str) -> String {
    format!("playlists:{}", user_id)
}
