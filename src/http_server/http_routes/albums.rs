use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::entities;
use crate::http_server::error::{ApiError, ApiResult};
use crate::http_server::extract::{AppJson, AppPath, AppQuery};
use crate::http_server::state::AppState;
use crate::services::album::AlbumService;

/// Album fields, taken from the query string.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumParams {
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlbumResponse {
    pub id: i64,
    pub title: String,
    pub artist: String,
}

impl From<entities::album::Model> for AlbumResponse {
    fn from(model: entities::album::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            artist: model.artist,
        }
    }
}

pub async fn create_album(
    State(app_state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<AlbumParams>,
) -> ApiResult<(StatusCode, AppJson<AlbumResponse>)> {
    let service = AlbumService::new(app_state.db.clone());
    let album = service.create(params.title, params.artist).await?;

    Ok((StatusCode::CREATED, AppJson(album.into())))
}

pub async fn list_albums(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<AppJson<Vec<AlbumResponse>>> {
    let service = AlbumService::new(app_state.db.clone());
    let albums = service.list_all().await?;

    Ok(AppJson(albums.into_iter().map(AlbumResponse::from).collect()))
}

pub async fn get_album(
    State(app_state): State<Arc<AppState>>,
    AppPath(album_id): AppPath<i64>,
) -> ApiResult<AppJson<AlbumResponse>> {
    let service = AlbumService::new(app_state.db.clone());
    let album = service
        .get_by_id(album_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Album not found"))?;

    Ok(AppJson(album.into()))
}

pub async fn update_album(
    State(app_state): State<Arc<AppState>>,
    AppPath(album_id): AppPath<i64>,
    AppQuery(params): AppQuery<AlbumParams>,
) -> ApiResult<AppJson<AlbumResponse>> {
    let service = AlbumService::new(app_state.db.clone());
    let album = service
        .update(album_id, params.title, params.artist)
        .await?
        .ok_or_else(|| ApiError::not_found("Album not found"))?;

    Ok(AppJson(album.into()))
}

pub async fn delete_album(
    State(app_state): State<Arc<AppState>>,
    AppPath(album_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    let service = AlbumService::new(app_state.db.clone());
    if !service.delete(album_id).await? {
        return Err(ApiError::not_found("Album not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
