pub mod album;
pub mod playlist;
pub mod playlist_song;
pub mod song;
