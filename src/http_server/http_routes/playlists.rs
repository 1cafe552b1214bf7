use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::http_server::error::{ApiError, ApiResult};
use crate::http_server::extract::{AppJson, AppPath, AppQuery};
use crate::http_server::http_routes::songs::{SearchParams, SongResponse};
use crate::http_server::state::AppState;
use crate::services::playlist::{PlaylistService, PlaylistWithSongs};

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistParams {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistResponse {
    pub id: i64,
    pub name: String,
    pub songs: Vec<SongResponse>,
}

impl From<PlaylistWithSongs> for PlaylistResponse {
    fn from(pws: PlaylistWithSongs) -> Self {
        Self {
            id: pws.playlist.id,
            name: pws.playlist.name,
            songs: pws.songs.into_iter().map(SongResponse::from).collect(),
        }
    }
}

pub async fn create_playlist(
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PlaylistParams>,
) -> ApiResult<(StatusCode, AppJson<PlaylistResponse>)> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlist = service.create(params.name).await?;

    Ok((StatusCode::CREATED, AppJson(playlist.into())))
}

pub async fn list_playlists(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<AppJson<Vec<PlaylistResponse>>> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlists = service.list_all().await?;

    Ok(AppJson(
        playlists.into_iter().map(PlaylistResponse::from).collect(),
    ))
}

pub async fn get_playlist(
    State(app_state): State<Arc<AppState>>,
    AppPath(playlist_id): AppPath<i64>,
) -> ApiResult<AppJson<PlaylistResponse>> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlist = service
        .get_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    Ok(AppJson(playlist.into()))
}

pub async fn update_playlist(
    State(app_state): State<Arc<AppState>>,
    AppPath(playlist_id): AppPath<i64>,
    AppQuery(params): AppQuery<PlaylistParams>,
) -> ApiResult<AppJson<PlaylistResponse>> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlist = service
        .update(playlist_id, params.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    Ok(AppJson(playlist.into()))
}

pub async fn delete_playlist(
    State(app_state): State<Arc<AppState>>,
    AppPath(playlist_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let service = PlaylistService::new(app_state.db.clone());
    if !service.delete(playlist_id).await? {
        return Err(ApiError::not_found("Playlist not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_song_to_playlist(
    State(app_state): State<Arc<AppState>>,
    AppPath((song_id, playlist_id)): AppPath<(i64, i64)>,
) -> ApiResult<AppJson<PlaylistResponse>> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlist = service
        .add_song(song_id, playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Song or playlist not found"))?;

    Ok(AppJson(playlist.into()))
}

pub async fn list_playlist_songs(
    State(app_state): State<Arc<AppState>>,
    AppPath(playlist_id): AppPath<i64>,
) -> ApiResult<AppJson<Vec<SongResponse>>> {
    let service = PlaylistService::new(app_state.db.clone());
    let songs = service
        .list_songs_in(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    Ok(AppJson(songs.into_iter().map(SongResponse::from).collect()))
}

/// An empty match is reported as 404, same as an unknown id.
pub async fn search_playlists(
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<AppJson<Vec<PlaylistResponse>>> {
    let service = PlaylistService::new(app_state.db.clone());
    let playlists = service.search(&params.name).await?;
    if playlists.is_empty() {
        return Err(ApiError::not_found("No playlists found"));
    }

    Ok(AppJson(
        playlists.into_iter().map(PlaylistResponse::from).collect(),
    ))
}
