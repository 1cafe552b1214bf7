use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::http_server::state::AppState;

pub mod albums;
pub mod playlists;
pub mod songs;

/// Every catalog endpoint, mounted under `/songs`. Collection paths answer
/// with or without the trailing slash.
pub fn catalog_routes() -> Router<Arc<AppState>> {
    let song_collection = get(songs::list_songs).post(songs::create_song);
    let album_collection = get(albums::list_albums).post(albums::create_album);
    let playlist_collection = get(playlists::list_playlists).post(playlists::create_playlist);

    Router::new()
        .route("/songs", song_collection.clone())
        .route("/songs/", song_collection)
        .route("/songs/songs/search", get(songs::search_songs))
        .route(
            "/songs/{song_id}",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        .route(
            "/songs/{song_id}/playlists/{playlist_id}",
            post(playlists::add_song_to_playlist),
        )
        .route("/songs/albums", album_collection.clone())
        .route("/songs/albums/", album_collection)
        .route(
            "/songs/albums/{album_id}",
            get(albums::get_album)
                .put(albums::update_album)
                .delete(albums::delete_album),
        )
        .route("/songs/playlists", playlist_collection.clone())
        .route("/songs/playlists/", playlist_collection)
        .route("/songs/playlists/search", get(playlists::search_playlists))
        .route(
            "/songs/playlists/{playlist_id}",
            get(playlists::get_playlist)
                .put(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/songs/playlists/{playlist_id}/songs",
            get(playlists::list_playlist_songs),
        )
}
