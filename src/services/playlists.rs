//! Playlist CRUD with cache-aside listing and ownership/collaboration checks.
//!
//! Any write touching a playlist owned by `u` deletes `playlists:{u}` before
//! returning. Entries are never updated in place and carry no expiry.
//! Adding or removing a collaborator does not invalidate anything, so a
//! collaborator's list can stay stale until the owner's next write.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheStore;
use crate::errors::{AppError, AppResult};
use crate::models::new_id;
use crate::models::playlist::{playlists_cache_key, PlaylistSummary};

/// Relational access to the `playlists` table.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Insert a row and return the id the store reports back, if any.
    async fn insert_playlist(&self, id: &str, name: &str, owner: &str)
        -> AppResult<Option<String>>;

    /// Playlists where `user_id` is the owner or a collaborator.
    async fn playlists_visible_to(&self, user_id: &str) -> AppResult<Vec<PlaylistSummary>>;

    async fn find_playlist(&self, id: &str) -> AppResult<Option<PlaylistSummary>>;

    async fn playlist_owner(&self, id: &str) -> AppResult<Option<String>>;

    /// Delete by id, returning the owner of the removed row.
    async fn delete_playlist(&self, id: &str) -> AppResult<Option<String>>;
}

/// Answers whether a user collaborates on a playlist.
#[async_trait]
pub trait CollaborationOracle: Send + Sync {
    async fn verify_collaborator(&self, playlist_id: &str, user_id: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PlaylistService {
    repo: Arc<dyn PlaylistRepository>,
    collaborations: Arc<dyn CollaborationOracle>,
    cache: Arc<dyn CacheStore>,
}

impl PlaylistService {
    pub fn new(
        repo: Arc<dyn PlaylistRepository>,
        collaborations: Arc<dyn CollaborationOracle>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            repo,
            collaborations,
            cache,
        }
    }

    pub async fn add_playlist(&self, name: &str, owner: &str) -> AppResult<String> {
        let id = new_id("playlist");

        let inserted = self
            .repo
            .insert_playlist(&id, name, owner)
            .await?
            .filter(|returned| !returned.is_empty())
            .ok_or_else(|| AppError::PersistenceCheckFailed("playlist could not be added".into()))?;

        self.invalidate(owner).await;

        tracing::info!(playlist_id = %inserted, owner = %owner, "playlist created");
        Ok(inserted)
    }

    pub async fn get_playlists(&self, user_id: &str) -> AppResult<Vec<PlaylistSummary>> {
        let key = playlists_cache_key(user_id);

        if let Some(raw) = self.cache.get(&key).await {
            match serde_json::from_str::<Vec<PlaylistSummary>>(&raw) {
                Ok(playlists) => return Ok(playlists),
                Err(e) => {
                    tracing::debug!(key = %key, "unreadable cache entry, treating as miss: {}", e)
                }
            }
        }

        let playlists = self.repo.playlists_visible_to(user_id).await?;

        match serde_json::to_string(&playlists) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&key, &json).await {
                    tracing::warn!(key = %key, "failed to populate playlist cache: {}", e);
                }
            }
            Err(e) => tracing::warn!(key = %key, "failed to serialize playlists: {}", e),
        }

        Ok(playlists)
    }

    pub async fn get_playlist_by_id(&self, id: &str) -> AppResult<PlaylistSummary> {
        self.repo
            .find_playlist(id)
            .await?
            .ok_or_else(|| AppError::NotFound("playlist not found".into()))
    }

    pub async fn delete_playlist_by_id(&self, id: &str) -> AppResult<()> {
        let owner = self.repo.delete_playlist(id).await?.ok_or_else(|| {
            AppError::NotFound("playlist could not be deleted, id not found".into())
        })?;

        self.invalidate(&owner).await;

        tracing::info!(playlist_id = %id, owner = %owner, "playlist deleted");
        Ok(())
    }

    pub async fn verify_playlist_owner(&self, playlist_id: &str, user_id: &str) -> AppResult<()> {
        let owner = self
            .repo
            .playlist_owner(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("playlist not found".into()))?;

        if owner != user_id {
            return Err(AppError::Forbidden(
                "you are not allowed to access this resource".into(),
            ));
        }
        Ok(())
    }

    /// Owner first, collaborator as fallback.
    ///
    /// A missing playlist is reported as `NotFound` without asking the oracle.
    /// When both checks fail, the ownership `Forbidden` is returned and the
    /// oracle's own error is dropped.
    pub async fn verify_playlist_access(&self, playlist_id: &str, user_id: &str) -> AppResult<()> {
        match self.verify_playlist_owner(playlist_id, user_id).await {
            Ok(()) => Ok(()),
            Err(denied @ AppError::Forbidden(_)) => {
                match self
                    .collaborations
                    .verify_collaborator(playlist_id, user_id)
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        tracing::debug!(
                            playlist_id = %playlist_id,
                            user_id = %user_id,
                            "collaboration check failed: {}",
                            e
                        );
                        Err(denied)
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn invalidate(&self, owner: &str) {
        let key = playlists_cache_key(owner);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!(key = %key, "failed to invalidate playlist cache: {}", e);
        }
    }
}
