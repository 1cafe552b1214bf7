use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Album::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Album::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Album::Title).string().not_null())
                    .col(ColumnDef::new(Album::Artist).string().not_null())
                    .to_owned(),
            )
            .await?;

        // album_id is nullable so that deleting an album can clear it
        manager
            .create_table(
                Table::create()
                    .table(Song::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Song::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Song::Title).string().not_null())
                    .col(ColumnDef::new(Song::Artist).string().not_null())
                    .col(ColumnDef::new(Song::AlbumId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_songs_album_id")
                            .from(Song::Table, Song::AlbumId)
                            .to(Album::Table, Album::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Playlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlist::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlaylistSong::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlaylistSong::PlaylistId).integer().not_null())
                    .col(ColumnDef::new(PlaylistSong::SongId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(PlaylistSong::PlaylistId)
                            .col(PlaylistSong::SongId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_songs_playlist_id")
                            .from(PlaylistSong::Table, PlaylistSong::PlaylistId)
                            .to(Playlist::Table, Playlist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_songs_song_id")
                            .from(PlaylistSong::Table, PlaylistSong::SongId)
                            .to(Song::Table, Song::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_songs_album_id")
                    .table(Song::Table)
                    .col(Song::AlbumId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse dependency order
        manager
            .drop_table(Table::drop().table(PlaylistSong::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Song::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Album::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Album {
    #[sea_orm(iden = "albums")]
    Table,
    Id,
    Title,
    Artist,
}

#[derive(DeriveIden)]
enum Song {
    #[sea_orm(iden = "songs")]
    Table,
    Id,
    Title,
    Artist,
    AlbumId,
}

#[derive(DeriveIden)]
enum Playlist {
    #[sea_orm(iden = "playlists")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum PlaylistSong {
    #[sea_orm(iden = "playlist_songs")]
    Table,
    PlaylistId,
    SongId,
}
