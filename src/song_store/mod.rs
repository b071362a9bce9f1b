mod models;
mod schema;
mod sqlite_song_store;

pub use models::*;
pub use schema::SONG_VERSIONED_SCHEMAS;
pub use sqlite_song_store::SqliteSongStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongStoreError {
    #[error("song {0} not found")]
    NotFound(SongId),

    /// Any failure of the underlying storage engine.
    #[error("song store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for SongStoreError {
    fn from(err: rusqlite::Error) -> Self {
        SongStoreError::Unavailable(err.to_string())
    }
}

pub type SongStoreResult<T> = Result<T, SongStoreError>;

/// Durable storage of songs.
///
/// Songs are never physically removed, `soft_delete` only stamps
/// `deleted_at`. Every read except [`SongStore::find_any`] skips soft deleted
/// songs.
pub trait SongStore: Send + Sync {
    fn create(&self, song: NewSong) -> SongStoreResult<Song>;

    /// Looks up a song that has not been soft deleted.
    fn find_active(&self, id: SongId) -> SongStoreResult<Song>;

    /// Looks up a song regardless of its soft delete marker.
    fn find_any(&self, id: SongId) -> SongStoreResult<Song>;

    /// First active song (lowest id) with exactly this group and title.
    fn find_by_group_and_title(&self, group: &str, title: &str) -> SongStoreResult<Option<Song>>;

    /// Active songs matching `filter`, ordered by id.
    fn list(&self, filter: &SongFilter, pagination: Pagination) -> SongStoreResult<Vec<Song>>;

    /// Overwrites the stored fields of an active song and refreshes `updated_at`.
    fn update(&self, song: &Song) -> SongStoreResult<Song>;

    fn soft_delete(&self, id: SongId) -> SongStoreResult<()>;

    fn count_active(&self) -> SongStoreResult<usize>;
}
