use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities;
use crate::services::contains_literal;

/// Result of replacing a song, telling apart which side of the reference is missing.
#[derive(Debug, Clone, PartialEq)]
pub enum SongUpdate {
    Updated(entities::song::Model),
    SongNotFound,
    AlbumNotFound,
}

pub struct SongService {
    db: Arc<Database>,
}

impl SongService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new song. Returns `None` when `album_id` does not reference an
    /// existing album.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        title: String,
        artist: String,
        album_id: i64,
    ) -> Result<Option<entities::song::Model>> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let album = entities::album::Entity::find_by_id(album_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find album")?;
        if album.is_none() {
            log::debug!("Album {} not found, song not created", album_id);
            return Ok(None);
        }

        let song = entities::song::ActiveModel {
            title: Set(title),
            artist: Set(artist),
            album_id: Set(Some(album_id)),
            ..Default::default()
        };

        let model = song
            .insert(&txn)
            .await
            .wrap_err("Failed to create song")?;

        txn.commit().await.wrap_err("Failed to commit song")?;

        log::info!("Song created: '{}' (ID: {})", model.title, model.id);
        Ok(Some(model))
    }

    pub async fn get_by_id(&self, song_id: i64) -> Result<Option<entities::song::Model>> {
        entities::song::Entity::find_by_id(song_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to get song")
    }

    pub async fn list_all(&self) -> Result<Vec<entities::song::Model>> {
        entities::song::Entity::find()
            .order_by_asc(entities::song::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to list songs")
    }

    /// Replace every field of a song. Nothing is written when either the song
    /// or the album it should point at is missing.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        song_id: i64,
        title: String,
        artist: String,
        album_id: i64,
    ) -> Result<SongUpdate> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let Some(song) = entities::song::Entity::find_by_id(song_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find song")?
        else {
            return Ok(SongUpdate::SongNotFound);
        };

        let album = entities::album::Entity::find_by_id(album_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find album")?;
        if album.is_none() {
            log::debug!("Album {} not found, song {} left unchanged", album_id, song_id);
            return Ok(SongUpdate::AlbumNotFound);
        }

        let mut active_song: entities::song::ActiveModel = song.into();
        active_song.title = Set(title);
        active_song.artist = Set(artist);
        active_song.album_id = Set(Some(album_id));
        let model = active_song
            .update(&txn)
            .await
            .wrap_err("Failed to update song")?;

        txn.commit().await.wrap_err("Failed to commit song update")?;

        log::info!("Song updated: '{}' (ID: {})", model.title, model.id);
        Ok(SongUpdate::Updated(model))
    }

    /// Hard delete. Links to playlists go in the same transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, song_id: i64) -> Result<bool> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        entities::playlist_song::Entity::delete_many()
            .filter(entities::playlist_song::Column::SongId.eq(song_id))
            .exec(&txn)
            .await
            .wrap_err("Failed to unlink song from playlists")?;

        let result = entities::song::Entity::delete_by_id(song_id)
            .exec(&txn)
            .await
            .wrap_err("Failed to delete song")?;

        if result.rows_affected == 0 {
            return Ok(false);
        }

        txn.commit().await.wrap_err("Failed to commit song delete")?;

        log::info!("Song deleted (ID: {})", song_id);
        Ok(true)
    }

    /// Case-insensitive substring match on the title. Wildcard characters in
    /// `name` match only themselves.
    pub async fn search(&self, name: &str) -> Result<Vec<entities::song::Model>> {
        entities::song::Entity::find()
            .filter(entities::song::Column::Title.like(contains_literal(name)))
            .order_by_asc(entities::song::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to search songs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::album::AlbumService;
    use crate::services::playlist::PlaylistService;
    use crate::test_utils::test_db;

    async fn insert_album(db: &Arc<Database>) -> entities::album::Model {
        AlbumService::new(db.clone())
            .create("Test Album".into(), "Test Artist".into())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);

        let created = service
            .create("Song".into(), "Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Song");
        assert_eq!(fetched.artist, "Artist");
        assert_eq!(fetched.album_id, Some(album.id));
    }

    #[tokio::test]
    async fn test_create_with_missing_album() {
        let db = test_db().await;
        let service = SongService::new(db);

        let created = service
            .create("Song".into(), "Artist".into(), 9999)
            .await
            .unwrap();

        assert!(created.is_none());
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_all_fields() {
        let db = test_db().await;
        let first = insert_album(&db).await;
        let second = insert_album(&db).await;
        let service = SongService::new(db);
        let song = service
            .create("Old Title".into(), "Old Artist".into(), first.id)
            .await
            .unwrap()
            .unwrap();

        let updated = service
            .update(song.id, "New Title".into(), "New Artist".into(), second.id)
            .await
            .unwrap();
        assert!(matches!(updated, SongUpdate::Updated(_)));

        let fetched = service.get_by_id(song.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "New Title");
        assert_eq!(fetched.artist, "New Artist");
        assert_eq!(fetched.album_id, Some(second.id));
    }

    #[tokio::test]
    async fn test_update_missing_song_or_album() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);
        let song = service
            .create("Title".into(), "Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap();

        let missing_song = service
            .update(9999, "T".into(), "A".into(), album.id)
            .await
            .unwrap();
        assert_eq!(missing_song, SongUpdate::SongNotFound);

        let missing_album = service
            .update(song.id, "T".into(), "A".into(), 9999)
            .await
            .unwrap();
        assert_eq!(missing_album, SongUpdate::AlbumNotFound);

        let unchanged = service.get_by_id(song.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Title");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);
        let song = service
            .create("Title".into(), "Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap();

        assert!(service.delete(song.id).await.unwrap());
        assert!(service.get_by_id(song.id).await.unwrap().is_none());
        assert!(!service.delete(song.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_playlist_links() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db.clone());
        let playlists = PlaylistService::new(db);
        let song = service
            .create("Title".into(), "Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap();
        let playlist = playlists.create("Mix".into()).await.unwrap();
        playlists
            .add_song(song.id, playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();

        assert!(service.delete(song.id).await.unwrap());

        let songs = playlists
            .list_songs_in(playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();
        assert!(songs.is_empty());
    }

    #[tokio::test]
    async fn test_search_is_substring_and_case_insensitive() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);
        let hit = service
            .create("Bohemian Rhapsody".into(), "Queen".into(), album.id)
            .await
            .unwrap()
            .unwrap();
        service
            .create("Imagine".into(), "John Lennon".into(), album.id)
            .await
            .unwrap()
            .unwrap();

        let found = service.search("rhaps").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, hit.id);

        assert!(service.search("nothing like this").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_contains_created() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);
        let a = service
            .create("Song 1".into(), "Artist 1".into(), album.id)
            .await
            .unwrap()
            .unwrap();
        let b = service
            .create("Song 2".into(), "Artist 2".into(), album.id)
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<i64> = service
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = test_db().await;
        let album = insert_album(&db).await;
        let service = SongService::new(db);
        for title in ["abc", "1000", "a_c", "50% Off", r"C:\Music"] {
            service
                .create(title.into(), "Artist".into(), album.id)
                .await
                .unwrap()
                .unwrap();
        }

        let titles = |songs: Vec<entities::song::Model>| -> Vec<String> {
            songs.into_iter().map(|s| s.title).collect()
        };

        assert_eq!(titles(service.search("a_c").await.unwrap()), vec!["a_c"]);
        assert_eq!(titles(service.search("0%").await.unwrap()), vec!["50% Off"]);
        assert_eq!(titles(service.search("%").await.unwrap()), vec!["50% Off"]);
        assert_eq!(titles(service.search(r"").await.unwrap()), vec![r"C:\Music"]);
        assert!(service.search("100%").await.unwrap().is_empty());
        assert_eq!(titles(service.search("_").await.unwrap()), vec!["a_c"]);
    }
}
