use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "playlists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::playlist_song::Entity")]
    PlaylistSong,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        super::playlist_song::Relation::Song.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::playlist_song::Relation::Playlist.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
