use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::entities;
use crate::http_server::error::{ApiError, ApiResult};
use crate::http_server::extract::{AppJson, AppPath, AppQuery};
use crate::http_server::state::AppState;
use crate::services::song::{SongService, SongUpdate};

/// Body for creating or replacing a song. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SongPayload {
    pub title: String,
    pub artist: String,
    pub album_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongResponse {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album_id: Option<i64>,
}

impl From<entities::song::Model> for SongResponse {
    fn from(model: entities::song::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            artist: model.artist,
            album_id: model.album_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub name: String,
}

pub async fn create_song(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SongPayload>,
) -> ApiResult<(StatusCode, AppJson<SongResponse>)> {
    let service = SongService::new(app_state.db.clone());
    let album_id = payload.album_id;
    let song = service
        .create(payload.title, payload.artist, album_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Album not found: {}", album_id)))?;

    Ok((StatusCode::CREATED, AppJson(song.into())))
}

pub async fn list_songs(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<AppJson<Vec<SongResponse>>> {
    let service = SongService::new(app_state.db.clone());
    let songs = service.list_all().await?;

    Ok(AppJson(songs.into_iter().map(SongResponse::from).collect()))
}

pub async fn get_song(
    State(app_state): State<Arc<AppState>>,
    AppPath(song_id): AppPath<i64>,
) -> ApiResult<AppJson<SongResponse>> {
    let service = SongService::new(app_state.db.clone());
    let song = service
        .get_by_id(song_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Song not found"))?;

    Ok(AppJson(song.into()))
}

pub async fn update_song(
    State(app_state): State<Arc<AppState>>,
    AppPath(song_id): AppPath<i64>,
    AppJson(payload): AppJson<SongPayload>,
) -> ApiResult<AppJson<SongResponse>> {
    let service = SongService::new(app_state.db.clone());
    let album_id = payload.album_id;
    match service
        .update(song_id, payload.title, payload.artist, album_id)
        .await?
    {
        SongUpdate::Updated(song) => Ok(AppJson(song.into())),
        SongUpdate::SongNotFound => Err(ApiError::not_found("Song not found")),
        SongUpdate::AlbumNotFound => Err(ApiError::not_found(format!(
            "Album not found: {}",
            album_id
        ))),
    }
}

pub async fn delete_song(
    State(app_state): State<Arc<AppState>>,
    AppPath(song_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let service = SongService::new(app_state.db.clone());
    if !service.delete(song_id).await? {
        return Err(ApiError::not_found("Song not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// An empty match is reported as 404, same as an unknown id.
pub async fn search_songs(
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<AppJson<Vec<SongResponse>>> {
    let service = SongService::new(app_state.db.clone());
    let songs = service.search(&params.name).await?;
    if songs.is_empty() {
        return Err(ApiError::not_found("No songs found"));
    }

    Ok(AppJson(songs.into_iter().map(SongResponse::from).collect()))
}
