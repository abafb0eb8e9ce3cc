use std::sync::Arc;

use crate::auth::tokens::TokenManager;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::queue::PlaylistExportProducer;
use crate::services::{
    AuthenticationFlow, CollaborationOracle, CredentialVerifier, ExportService, PlaylistRepository,
    PlaylistService, RefreshTokenLedger, UserDirectory, UserRegistry,
};

/// Shared application state passed to handlers and extractors.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenManager,
    pub auth: AuthenticationFlow,
    pub playlists: PlaylistService,
    pub users: UserRegistry,
    pub exports: ExportService,
}

impl AppState {
    /// Wire every service onto one store that provides all relational collaborators.
    pub fn new<S>(
        config: Config,
        store: Arc<S>,
        cache: Arc<dyn CacheStore>,
        exports: Arc<dyn PlaylistExportProducer>,
    ) -> Self
    where
        S: CredentialVerifier
            + RefreshTokenLedger
            + PlaylistRepository
            + CollaborationOracle
            + UserDirectory
            + 'static,
    {
        let tokens = TokenManager::new(
            &config.access_token_key,
            &config.refresh_token_key,
            config.access_token_age,
        );

        let auth = AuthenticationFlow::new(
            store.clone() as Arc<dyn CredentialVerifier>,
            store.clone() as Arc<dyn RefreshTokenLedger>,
            tokens.clone(),
        );
        let playlists = PlaylistService::new(
            store.clone() as Arc<dyn PlaylistRepository>,
            store.clone() as Arc<dyn CollaborationOracle>,
            cache,
        );
        let users = UserRegistry::new(store as Arc<dyn UserDirectory>);
        let exports = ExportService::new(exports);

        Self {
            config,
            tokens,
            auth,
            playlists,
            users,
            exports,
        }
    }
}
