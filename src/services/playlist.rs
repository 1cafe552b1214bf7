use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities;
use crate::services::contains_literal;

/// A playlist together with its songs, ordered by song id.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistWithSongs {
    pub playlist: entities::playlist::Model,
    pub songs: Vec<entities::song::Model>,
}

impl PlaylistWithSongs {
    fn new(playlist: entities::playlist::Model, mut songs: Vec<entities::song::Model>) -> Self {
        songs.sort_by_key(|song| song.id);
        Self { playlist, songs }
    }
}

pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: String) -> Result<PlaylistWithSongs> {
        let playlist = entities::playlist::ActiveModel {
            name: Set(name),
            ..Default::default()
        };

        let model = playlist
            .insert(&self.db.conn)
            .await
            .wrap_err("Failed to create playlist")?;

        log::info!("Playlist created: '{}' (ID: {})", model.name, model.id);
        Ok(PlaylistWithSongs::new(model, Vec::new()))
    }

    pub async fn get_by_id(&self, playlist_id: i64) -> Result<Option<PlaylistWithSongs>> {
        let playlist = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to find playlist")?;

        match playlist {
            Some(playlist) => Ok(Some(self.with_songs(playlist).await?)),
            None => Ok(None),
        }
    }

    /// Every playlist, with songs joined in through `playlist_songs`.
    pub async fn list_all(&self) -> Result<Vec<PlaylistWithSongs>> {
        let rows = entities::playlist::Entity::find()
            .order_by_asc(entities::playlist::Column::Id)
            .find_with_related(entities::song::Entity)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to list playlists")?;

        Ok(rows
            .into_iter()
            .map(|(playlist, songs)| PlaylistWithSongs::new(playlist, songs))
            .collect())
    }

    /// Link a song to a playlist. Returns `None` if either side is missing.
    /// Adding a pair that is already linked leaves the playlist unchanged.
    #[instrument(skip(self))]
    pub async fn add_song(
        &self,
        song_id: i64,
        playlist_id: i64,
    ) -> Result<Option<PlaylistWithSongs>> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let Some(playlist) = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find playlist")?
        else {
            return Ok(None);
        };

        let song = entities::song::Entity::find_by_id(song_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find song")?;
        if song.is_none() {
            return Ok(None);
        }

        // Check if song is already in playlist
        let existing = entities::playlist_song::Entity::find()
            .filter(
                Condition::all()
                    .add(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
                    .add(entities::playlist_song::Column::SongId.eq(song_id)),
            )
            .one(&txn)
            .await
            .wrap_err("Failed to check existing playlist song")?;

        if existing.is_none() {
            let link = entities::playlist_song::ActiveModel {
                playlist_id: Set(playlist_id),
                song_id: Set(song_id),
            };
            entities::playlist_song::Entity::insert(link)
                .exec(&txn)
                .await
                .wrap_err("Failed to add song to playlist")?;
            log::info!("Song {} added to playlist {}", song_id, playlist_id);
        } else {
            log::debug!("Song {} already in playlist {}", song_id, playlist_id);
        }

        txn.commit()
            .await
            .wrap_err("Failed to commit playlist song")?;

        Ok(Some(self.with_songs(playlist).await?))
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        playlist_id: i64,
        new_name: String,
    ) -> Result<Option<PlaylistWithSongs>> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let Some(playlist) = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find playlist")?
        else {
            return Ok(None);
        };

        let mut active_playlist: entities::playlist::ActiveModel = playlist.into();
        active_playlist.name = Set(new_name);
        let model = active_playlist
            .update(&txn)
            .await
            .wrap_err("Failed to update playlist")?;

        txn.commit()
            .await
            .wrap_err("Failed to commit playlist update")?;

        log::info!("Playlist renamed: '{}' (ID: {})", model.name, model.id);
        Ok(Some(self.with_songs(model).await?))
    }

    /// Hard delete, together with the playlist's song links.
    #[instrument(skip(self))]
    pub async fn delete(&self, playlist_id: i64) -> Result<bool> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        entities::playlist_song::Entity::delete_many()
            .filter(entities::playlist_song::Column::PlaylistId.eq(playlist_id))
            .exec(&txn)
            .await
            .wrap_err("Failed to unlink songs from playlist")?;

        let result = entities::playlist::Entity::delete_by_id(playlist_id)
            .exec(&txn)
            .await
            .wrap_err("Failed to delete playlist")?;

        if result.rows_affected == 0 {
            return Ok(false);
        }

        txn.commit()
            .await
            .wrap_err("Failed to commit playlist delete")?;

        log::info!("Playlist deleted (ID: {})", playlist_id);
        Ok(true)
    }

    /// Case-insensitive substring match on the name. Wildcard characters in
    /// `name` match only themselves.
    pub async fn search(&self, name: &str) -> Result<Vec<PlaylistWithSongs>> {
        let rows = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::Name.like(contains_literal(name)))
            .order_by_asc(entities::playlist::Column::Id)
            .find_with_related(entities::song::Entity)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to search playlists")?;

        Ok(rows
            .into_iter()
            .map(|(playlist, songs)| PlaylistWithSongs::new(playlist, songs))
            .collect())
    }

    /// Songs linked to a playlist, or `None` when the playlist does not exist.
    pub async fn list_songs_in(
        &self,
        playlist_id: i64,
    ) -> Result<Option<Vec<entities::song::Model>>> {
        Ok(self
            .get_by_id(playlist_id)
            .await?
            .map(|playlist| playlist.songs))
    }

    async fn with_songs(
        &self,
        playlist: entities::playlist::Model,
    ) -> Result<PlaylistWithSongs> {
        let songs = playlist
            .find_related(entities::song::Entity)
            .order_by_asc(entities::song::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist songs")?;

        Ok(PlaylistWithSongs::new(playlist, songs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::album::AlbumService;
    use crate::services::song::SongService;
    use crate::test_utils::test_db;

    async fn insert_song(db: &Arc<Database>, title: &str) -> entities::song::Model {
        let album = AlbumService::new(db.clone())
            .create("Album".into(), "Artist".into())
            .await
            .unwrap();
        SongService::new(db.clone())
            .create(title.into(), "Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_starts_empty() {
        let db = test_db().await;
        let service = PlaylistService::new(db);

        let playlist = service.create("Road Trip".into()).await.unwrap();

        assert_eq!(playlist.playlist.name, "Road Trip");
        assert!(playlist.songs.is_empty());
    }

    #[tokio::test]
    async fn test_add_song_then_list() {
        let db = test_db().await;
        let song = insert_song(&db, "Playlist Song").await;
        let service = PlaylistService::new(db);
        let playlist = service.create("Mix".into()).await.unwrap();

        let updated = service
            .add_song(song.id, playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.songs, vec![song.clone()]);

        let songs = service
            .list_songs_in(playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(songs, vec![song]);
    }

    #[tokio::test]
    async fn test_add_same_song_twice() {
        let db = test_db().await;
        let song = insert_song(&db, "Repeat").await;
        let service = PlaylistService::new(db);
        let playlist = service.create("Mix".into()).await.unwrap();

        service
            .add_song(song.id, playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();
        let again = service
            .add_song(song.id, playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(again.songs.len(), 1);
        let songs = service
            .list_songs_in(playlist.playlist.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(songs.len(), 1);
    }

    #[tokio::test]
    async fn test_add_song_missing_side() {
        let db = test_db().await;
        let song = insert_song(&db, "Lonely").await;
        let service = PlaylistService::new(db);
        let playlist = service.create("Mix".into()).await.unwrap();

        assert!(
            service
                .add_song(9999, playlist.playlist.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(service.add_song(song.id, 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_includes_songs() {
        let db = test_db().await;
        let first = insert_song(&db, "First").await;
        let second = insert_song(&db, "Second").await;
        let service = PlaylistService::new(db);
        let full = service.create("Full".into()).await.unwrap();
        let empty = service.create("Empty".into()).await.unwrap();
        service.add_song(second.id, full.playlist.id).await.unwrap();
        service.add_song(first.id, full.playlist.id).await.unwrap();

        let playlists = service.list_all().await.unwrap();

        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].playlist, full.playlist);
        assert_eq!(playlists[0].songs, vec![first, second]);
        assert_eq!(playlists[1].playlist, empty.playlist);
        assert!(playlists[1].songs.is_empty());
    }

    #[tokio::test]
    async fn test_update_name() {
        let db = test_db().await;
        let service = PlaylistService::new(db);
        let playlist = service.create("Old".into()).await.unwrap();

        let renamed = service
            .update(playlist.playlist.id, "New".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.playlist.name, "New");

        assert!(service.update(9999, "Nope".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search() {
        let db = test_db().await;
        let service = PlaylistService::new(db);
        let workout = service.create("Workout Hits".into()).await.unwrap();
        service.create("Chill".into()).await.unwrap();

        let found = service.search("WORKOUT").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].playlist.id, workout.playlist.id);

        assert!(service.search("jazz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_songs_in_missing_playlist() {
        let db = test_db().await;
        let service = PlaylistService::new(db);

        assert!(service.list_songs_in(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_keeps_songs() {
        let db = test_db().await;
        let song = insert_song(&db, "Survivor").await;
        let service = PlaylistService::new(db.clone());
        let playlist = service.create("Temp".into()).await.unwrap();
        service
            .add_song(song.id, playlist.playlist.id)
            .await
            .unwrap();

        assert!(service.delete(playlist.playlist.id).await.unwrap());
        assert!(!service.delete(playlist.playlist.id).await.unwrap());
        assert!(service.get_by_id(playlist.playlist.id).await.unwrap().is_none());

        let still_there = SongService::new(db).get_by_id(song.id).await.unwrap();
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = test_db().await;
        let service = PlaylistService::new(db);
        service.create("abc".into()).await.unwrap();
        let underscored = service.create("a_c".into()).await.unwrap();
        let percent = service.create("100% Hits".into()).await.unwrap();

        let ids = |found: Vec<PlaylistWithSongs>| -> Vec<i64> {
            found.into_iter().map(|p| p.playlist.id).collect()
        };

        assert_eq!(ids(service.search("a_c").await.unwrap()), vec![underscored.playlist.id]);
        assert_eq!(ids(service.search("%").await.unwrap()), vec![percent.playlist.id]);
        assert!(service.search("1000").await.unwrap().is_empty());
        assert!(service.search("b%").await.unwrap().is_empty());
    }
}
