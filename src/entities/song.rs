use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub artist: String,
    /// Cleared when the album is deleted
    pub album_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::album::Entity",
        from = "Column::AlbumId",
        to = "super::album::Column::Id",
        on_delete = "SetNull"
    )]
    Album,
    #[sea_orm(has_many = "super::playlist_song::Entity")]
    PlaylistSong,
}

impl Related<super::album::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Album.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        super::playlist_song::Relation::Playlist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::playlist_song::Relation::Song.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
