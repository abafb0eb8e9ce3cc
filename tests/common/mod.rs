//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use openmusic::auth::password::verify_password;
use openmusic::auth::TokenManager;
use openmusic::cache::{CacheStore, MemoryCache};
use openmusic::config::Config;
use openmusic::errors::{AppError, AppResult};
use openmusic::models::playlist::PlaylistSummary;
use openmusic::models::user::NewUser;
use openmusic::queue::{MemoryExportQueue, PlaylistExportProducer};
use openmusic::services::{
    AuthenticationFlow, CollaborationOracle, CredentialVerifier, PlaylistRepository,
    PlaylistService, RefreshTokenLedger, UserDirectory,
};
use openmusic::AppState;

pub const ACCESS_KEY: &str = "test-access-key";
pub const REFRESH_KEY: &str = "test-refresh-key";

#[derive(Clone)]
struct StoredUser {
    id: String,
    username: String,
    password: String,
}

#[derive(Clone)]
struct StoredPlaylist {
    id: String,
    name: String,
    owner: String,
}

#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    authentications: HashSet<String>,
    playlists: Vec<StoredPlaylist>,
    collaborations: HashSet<(String, String)>,
}

/// Stand-in for Postgres implementing every relational collaborator.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    pub reject_ledger_writes: AtomicBool,
    pub insert_returns_no_id: AtomicBool,
    pub oracle_unavailable: AtomicBool,
    pub oracle_calls: AtomicUsize,
    pub visible_queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a user whose password is compared verbatim.
    pub fn seed_user(&self, id: &str, username: &str, password: &str) {
        self.tables.lock().unwrap().users.push(StoredUser {
            id: id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    pub fn seed_playlist(&self, id: &str, name: &str, owner: &str) {
        self.tables.lock().unwrap().playlists.push(StoredPlaylist {
            id: id.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
        });
    }

    pub fn seed_collaboration(&self, playlist_id: &str, user_id: &str) {
        self.tables
            .lock()
            .unwrap()
            .collaborations
            .insert((playlist_id.to_string(), user_id.to_string()));
    }

    /// Put a token straight into the ledger, bypassing login.
    pub fn seed_refresh_token(&self, token: &str) {
        self.tables
            .lock()
            .unwrap()
            .authentications
            .insert(token.to_string());
    }

    pub fn ledger_contains(&self, token: &str) -> bool {
        self.tables.lock().unwrap().authentications.contains(token)
    }

    pub fn ledger_len(&self) -> usize {
        self.tables.lock().unwrap().authentications.len()
    }

    pub fn playlist_exists(&self, id: &str) -> bool {
        self.tables.lock().unwrap().playlists.iter().any(|p| p.id == id)
    }

    fn username_of(tables: &Tables, user_id: &str) -> String {
        tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryStore {
    async fn verify_credentials(&self, username: &str, password: &str) -> AppResult<String> {
        let user = {
            let tables = self.tables.lock().unwrap();
            tables.users.iter().find(|u| u.username == username).cloned()
        };
        let Some(user) = user else {
            return Err(AppError::InvalidCredentials);
        };

        let matches = if user.password.starts_with("$argon2") {
            verify_password(password, &user.password)?
        } else {
            user.password == password
        };

        if matches {
            Ok(user.id)
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

#[async_trait]
impl RefreshTokenLedger for InMemoryStore {
    async fn add_refresh_token(&self, token: &str) -> AppResult<()> {
        if self.reject_ledger_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("ledger unavailable".into()));
        }
        self.tables
            .lock()
            .unwrap()
            .authentications
            .insert(token.to_string());
        Ok(())
    }

    async fn contains_refresh_token(&self, token: &str) -> AppResult<bool> {
        Ok(self.ledger_contains(token))
    }

    async fn delete_refresh_token(&self, token: &str) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().authentications.remove(token))
    }
}

#[async_trait]
impl PlaylistRepository for InMemoryStore {
    async fn insert_playlist(
        &self,
        id: &str,
        name: &str,
        owner: &str,
    ) -> AppResult<Option<String>> {
        if self.insert_returns_no_id.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.seed_playlist(id, name, owner);
        Ok(Some(id.to_string()))
    }

    async fn playlists_visible_to(&self, user_id: &str) -> AppResult<Vec<PlaylistSummary>> {
        self.visible_queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<PlaylistSummary> = tables
            .playlists
            .iter()
            .filter(|p| {
                p.owner == user_id
                    || tables
                        .collaborations
                        .contains(&(p.id.clone(), user_id.to_string()))
            })
            .map(|p| PlaylistSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                username: Self::username_of(&tables, &p.owner),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_playlist(&self, id: &str) -> AppResult<Option<PlaylistSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .playlists
            .iter()
            .find(|p| p.id == id)
            .map(|p| PlaylistSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                username: Self::username_of(&tables, &p.owner),
            }))
    }

    async fn playlist_owner(&self, id: &str) -> AppResult<Option<String>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .playlists
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.owner.clone()))
    }

    async fn delete_playlist(&self, id: &str) -> AppResult<Option<String>> {
        let mut tables = self.tables.lock().unwrap();
        let pos = tables.playlists.iter().position(|p| p.id == id);
        Ok(pos.map(|i| tables.playlists.remove(i).owner))
    }
}

#[async_trait]
impl CollaborationOracle for InMemoryStore {
    async fn verify_collaborator(&self, playlist_id: &str, user_id: &str) -> AppResult<()> {
        self.oracle_calls.fetch_add(1, Ordering::SeqCst);
        if self.oracle_unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("collaborations table offline")));
        }
        let found = self
            .tables
            .lock()
            .unwrap()
            .collaborations
            .contains(&(playlist_id.to_string(), user_id.to_string()));
        if found {
            Ok(())
        } else {
            Err(AppError::NotFound("collaboration not found".into()))
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .any(|u| u.username == username))
    }

    async fn insert_user(&self, user: &NewUser) -> AppResult<Option<String>> {
        self.tables.lock().unwrap().users.push(StoredUser {
            id: user.id.clone(),
            username: user.username.clone(),
            password: user.password_hash.clone(),
        });
        Ok(Some(user.id.clone()))
    }
}

/// Cache whose every operation fails; reads already fold into misses.
#[derive(Default)]
pub struct BrokenCache {
    pub writes_attempted: AtomicUsize,
}

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        self.writes_attempted.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection refused")
    }

    async fn delete(&self, _key: &str) -> anyhow::Result<()> {
        self.writes_attempted.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection refused")
    }
}

/// Export queue that refuses every message.
pub struct BrokenExportQueue;

#[async_trait]
impl PlaylistExportProducer for BrokenExportQueue {
    async fn send_message(&self, _queue: &str, _message: &str) -> anyhow::Result<()> {
        anyhow::bail!("queue unreachable")
    }
}

pub fn token_manager() -> TokenManager {
    TokenManager::new(ACCESS_KEY, REFRESH_KEY, 1800)
}

pub fn auth_flow(store: &Arc<InMemoryStore>) -> AuthenticationFlow {
    AuthenticationFlow::new(store.clone(), store.clone(), token_manager())
}

pub fn playlist_service(
    store: &Arc<InMemoryStore>,
    cache: Arc<dyn CacheStore>,
) -> PlaylistService {
    PlaylistService::new(store.clone(), store.clone(), cache)
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new())
}

pub fn export_queue() -> Arc<MemoryExportQueue> {
    Arc::new(MemoryExportQueue::new())
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "postgres://unused".into(),
        redis_url: None,
        access_token_key: ACCESS_KEY.into(),
        refresh_token_key: REFRESH_KEY.into(),
        access_token_age: 1800,
        log_json: false,
    }
}

// ── HTTP helpers ─────────────────────────────────────────────

pub fn app(store: &Arc<InMemoryStore>) -> Router {
    app_with_queue(store, export_queue())
}

pub fn app_with_queue(
    store: &Arc<InMemoryStore>,
    queue: Arc<dyn PlaylistExportProducer>,
) -> Router {
    let state = AppState::new(test_config(), store.clone(), memory_cache(), queue);
    openmusic::api::router(Arc::new(state))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/authentications",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Authentication added");
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}
