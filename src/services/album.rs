use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities;

pub struct AlbumService {
    db: Arc<Database>,
}

impl AlbumService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, title: String, artist: String) -> Result<entities::album::Model> {
        let album = entities::album::ActiveModel {
            title: Set(title),
            artist: Set(artist),
            ..Default::default()
        };

        let model = album
            .insert(&self.db.conn)
            .await
            .wrap_err("Failed to create album")?;

        log::info!("Album created: '{}' (ID: {})", model.title, model.id);
        Ok(model)
    }

    pub async fn get_by_id(&self, album_id: i64) -> Result<Option<entities::album::Model>> {
        entities::album::Entity::find_by_id(album_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to get album")
    }

    pub async fn list_all(&self) -> Result<Vec<entities::album::Model>> {
        entities::album::Entity::find()
            .order_by_asc(entities::album::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to list albums")
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        album_id: i64,
        title: String,
        artist: String,
    ) -> Result<Option<entities::album::Model>> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let Some(album) = entities::album::Entity::find_by_id(album_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find album")?
        else {
            return Ok(None);
        };

        let mut active_album: entities::album::ActiveModel = album.into();
        active_album.title = Set(title);
        active_album.artist = Set(artist);
        let model = active_album
            .update(&txn)
            .await
            .wrap_err("Failed to update album")?;

        txn.commit().await.wrap_err("Failed to commit album update")?;

        log::info!("Album updated: '{}' (ID: {})", model.title, model.id);
        Ok(Some(model))
    }

    /// Hard delete. Songs on the album stay but lose their `album_id`.
    #[instrument(skip(self))]
    pub async fn delete(&self, album_id: i64) -> Result<bool> {
        let txn = self
            .db
            .conn
            .begin()
            .await
            .wrap_err("Failed to start transaction")?;

        let Some(album) = entities::album::Entity::find_by_id(album_id)
            .one(&txn)
            .await
            .wrap_err("Failed to find album")?
        else {
            return Ok(false);
        };

        let songs = entities::song::Entity::find()
            .filter(entities::song::Column::AlbumId.eq(album.id))
            .all(&txn)
            .await
            .wrap_err("Failed to find songs on album")?;

        let orphaned = songs.len();
        for song in songs {
            let mut active_song: entities::song::ActiveModel = song.into();
            active_song.album_id = Set(None);
            active_song
                .update(&txn)
                .await
                .wrap_err("Failed to clear album from song")?;
        }

        entities::album::Entity::delete_by_id(album.id)
            .exec(&txn)
            .await
            .wrap_err("Failed to delete album")?;

        txn.commit().await.wrap_err("Failed to commit album delete")?;

        log::info!(
            "Album deleted: '{}' (ID: {}), cleared album on {} songs",
            album.title,
            album.id,
            orphaned
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::song::SongService;
    use crate::test_utils::test_db;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let service = AlbumService::new(db);
        let a = service
            .create("Album 1".into(), "Artist 1".into())
            .await
            .unwrap();
        let b = service
            .create("Album 2".into(), "Artist 2".into())
            .await
            .unwrap();

        let albums = service.list_all().await.unwrap();
        assert_eq!(albums, vec![a, b]);
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let service = AlbumService::new(db);
        let album = service
            .create("Old Album Title".into(), "Old Artist".into())
            .await
            .unwrap();

        let updated = service
            .update(album.id, "New Album Title".into(), "New Artist".into())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, album.id);
        assert_eq!(updated.title, "New Album Title");
        assert_eq!(updated.artist, "New Artist");
    }

    #[tokio::test]
    async fn test_update_missing() {
        let db = test_db().await;
        let service = AlbumService::new(db);

        let updated = service
            .update(9999, "Title".into(), "Artist".into())
            .await
            .unwrap();

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_clears_song_album() {
        let db = test_db().await;
        let service = AlbumService::new(db.clone());
        let songs = SongService::new(db);
        let album = service
            .create("Delete Album".into(), "Delete Artist".into())
            .await
            .unwrap();
        let song = songs
            .create("Track".into(), "Delete Artist".into(), album.id)
            .await
            .unwrap()
            .unwrap();

        assert!(service.delete(album.id).await.unwrap());
        assert!(service.get_by_id(album.id).await.unwrap().is_none());

        let song = songs.get_by_id(song.id).await.unwrap().unwrap();
        assert_eq!(song.album_id, None);

        assert!(!service.delete(album.id).await.unwrap());
    }
}
