use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::api::validators::{
    ExportPlaylistPayload, LoginPayload, PlaylistPayload, RefreshTokenPayload, RegisterUserPayload,
};
use crate::auth::AuthUser;
use crate::errors::{AppError, AppResult};
use crate::models::playlist::PlaylistSummary;
use crate::services::TokenPair;
use crate::state::AppState;

// ── Response DTOs ────────────────────────────────────────────

/// Body of every successful response: `{status, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    fn success(message: Option<&'static str>, data: Option<T>) -> Json<Self> {
        Json(Self {
            status: "success",
            message,
            data,
        })
    }

    pub fn data(data: T) -> Json<Self> {
        Self::success(None, Some(data))
    }

    pub fn with_data(message: &'static str, data: T) -> Json<Self> {
        Self::success(Some(message), Some(data))
    }
}

impl Envelope<()> {
    pub fn message(message: &'static str) -> Json<Self> {
        Self::success(Some(message), None)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCreatedResponse {
    pub playlist_id: String,
}

#[derive(Serialize)]
pub struct PlaylistListResponse {
    pub playlists: Vec<PlaylistSummary>,
}

#[derive(Serialize)]
pub struct PlaylistResponse {
    pub playlist: PlaylistSummary,
}

/// Unwrap a JSON body, turning malformed JSON into a validation error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

// ── Users ────────────────────────────────────────────────────

/// POST /users: register a user
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterUserPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<UserCreatedResponse>>)> {
    let payload = body(payload)?;
    let valid = payload.validate()?;

    let user_id = state
        .users
        .register(valid.username, valid.password, valid.fullname)
        .await?;

    Ok((
        StatusCode::CREATED,
        Envelope::with_data("User added", UserCreatedResponse { user_id }),
    ))
}

// ── Authentications ──────────────────────────────────────────

/// POST /authentications: login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<TokenPair>>)> {
    let payload = body(payload)?;
    let (username, password) = payload.validate()?;

    let pair = state.auth.login(username, password).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_data("Authentication added", pair),
    ))
}

/// PUT /authentications: exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshTokenPayload>, JsonRejection>,
) -> AppResult<Json<Envelope<AccessTokenResponse>>> {
    let payload = body(payload)?;
    let refresh_token = payload.validate()?;

    let access_token = state.auth.refresh(refresh_token).await?;
    Ok(Envelope::with_data(
        "Access token refreshed",
        AccessTokenResponse { access_token },
    ))
}

/// DELETE /authentications: logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshTokenPayload>, JsonRejection>,
) -> AppResult<Json<Envelope<()>>> {
    let payload = body(payload)?;
    let refresh_token = payload.validate()?;

    state.auth.logout(refresh_token).await?;
    Ok(Envelope::message("Refresh token deleted"))
}

// ── Playlists ────────────────────────────────────────────────

/// POST /playlists: create a playlist owned by the caller
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<PlaylistPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<PlaylistCreatedResponse>>)> {
    let payload = body(payload)?;
    let name = payload.validate()?;

    let playlist_id = state.playlists.add_playlist(name, &user.id).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_data("Playlist added", PlaylistCreatedResponse { playlist_id }),
    ))
}

/// GET /playlists: playlists the caller owns or collaborates on
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Envelope<PlaylistListResponse>>> {
    let playlists = state.playlists.get_playlists(&user.id).await?;
    Ok(Envelope::data(PlaylistListResponse { playlists }))
}

/// GET /playlists/:id: readable by the owner and collaborators
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<PlaylistResponse>>> {
    state.playlists.verify_playlist_access(&id, &user.id).await?;
    let playlist = state.playlists.get_playlist_by_id(&id).await?;
    Ok(Envelope::data(PlaylistResponse { playlist }))
}

/// DELETE /playlists/:id: owner only
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<()>>> {
    state.playlists.verify_playlist_owner(&id, &user.id).await?;
    state.playlists.delete_playlist_by_id(&id).await?;
    Ok(Envelope::message("Playlist deleted"))
}

// ── Exports ──────────────────────────────────────────────────

/// POST /export/playlists/:id: queue an export of an owned playlist
pub async fn export_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ExportPlaylistPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<()>>)> {
    let payload = body(payload)?;
    let target_email = payload.validate()?;

    state.playlists.verify_playlist_owner(&id, &user.id).await?;
    state.exports.export_playlist(&id, target_email).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::message("Your request is being processed"),
    ))
}
