//! Orchestration of the song library: lookups, get-or-create enrichment,
//! merges on update and verse pagination.

use crate::enrichment::{EnrichmentError, EnrichmentSource, SongDetail};
use crate::server::metrics;
use crate::song_store::{
    NewSong, Pagination, Song, SongFilter, SongId, SongStore, SongStoreError,
};
use crate::verses::{paginate_verses, VerseError, VersePage};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("store failure: {0}")]
    StoreFailed(String),
}

impl From<SongStoreError> for ServiceError {
    fn from(err: SongStoreError) -> Self {
        match err {
            SongStoreError::NotFound(_) => ServiceError::NotFound,
            SongStoreError::Unavailable(reason) => ServiceError::StoreFailed(reason),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Body of `POST /songs`. Both fields are required and must not be blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSongRequest {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub song: String,
}

/// Body of `PUT /songs/{id}`.
///
/// Missing or blank fields leave the stored value untouched. Identifiers and
/// timestamps sent by clients are not part of this type and are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongUpdate {
    pub group: Option<String>,
    #[serde(rename = "song")]
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
}

impl SongUpdate {
    fn apply_to(self, song: &mut Song) {
        merge_field(&mut song.group, self.group);
        merge_field(&mut song.title, self.title);
        merge_field(&mut song.release_date, self.release_date);
        merge_field(&mut song.text, self.text);
        merge_field(&mut song.link, self.link);
    }
}

fn merge_field(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *target = trimmed.to_string();
        }
    }
}

fn require_non_blank<'a>(name: &str, value: &'a str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(format!("{} is required", name)));
    }
    Ok(trimmed)
}

pub struct SongService {
    store: Arc<dyn SongStore>,
    remote: Arc<dyn EnrichmentSource>,
    overlay: Option<Arc<dyn EnrichmentSource>>,
}

impl SongService {
    /// `remote` enriches new songs, `overlay` (if any) is consulted after
    /// get-or-create and only alters the returned detail.
    pub fn new(
        store: Arc<dyn SongStore>,
        remote: Arc<dyn EnrichmentSource>,
        overlay: Option<Arc<dyn EnrichmentSource>>,
    ) -> Self {
        Self {
            store,
            remote,
            overlay,
        }
    }

    async fn fetch_from(
        source: &dyn EnrichmentSource,
        group: &str,
        title: &str,
    ) -> Result<SongDetail, EnrichmentError> {
        let result = source.fetch(group, title).await;
        let outcome = match &result {
            Ok(_) => "hit",
            Err(EnrichmentError::NotFound) => "not_found",
            Err(EnrichmentError::FetchFailed(_)) => "failed",
        };
        metrics::record_enrichment_fetch(source.name(), outcome);
        result
    }

    async fn create_enriched(&self, group: &str, title: &str) -> ServiceResult<Song> {
        let detail = Self::fetch_from(self.remote.as_ref(), group, title)
            .await
            .map_err(|err| {
                warn!("Could not enrich {} - {}: {}", group, title, err);
                ServiceError::EnrichmentFailed(err.to_string())
            })?;

        let song = self.store.create(NewSong {
            group: group.to_string(),
            title: title.to_string(),
            release_date: detail.release_date,
            text: detail.text,
            link: detail.link,
        })?;
        metrics::record_song_created();
        info!("Created song {} ({} - {})", song.id, song.group, song.title);
        Ok(song)
    }

    /// Returns the detail of the first song matching (group, title), creating
    /// it through remote enrichment when the library has no such song.
    pub async fn get_or_create_detail(&self, group: &str, title: &str) -> ServiceResult<SongDetail> {
        let group = require_non_blank("group", group)?;
        let title = require_non_blank("song", title)?;

        let song = match self.store.find_by_group_and_title(group, title)? {
            Some(song) => {
                debug!("Found song {} for {} - {}", song.id, group, title);
                song
            }
            None => self.create_enriched(group, title).await?,
        };

        let mut detail = SongDetail {
            release_date: song.release_date,
            text: song.text,
            link: song.link,
        };

        if let Some(overlay) = &self.overlay {
            match Self::fetch_from(overlay.as_ref(), group, title).await {
                Ok(local) => detail = local,
                Err(EnrichmentError::NotFound) => {
                    debug!("No {} enrichment for {} - {}", overlay.name(), group, title)
                }
                Err(err) => warn!("Ignoring {} enrichment: {}", overlay.name(), err),
            }
        }

        Ok(detail)
    }

    pub fn list_songs(&self, filter: &SongFilter, pagination: Pagination) -> ServiceResult<Vec<Song>> {
        if filter.is_empty() {
            debug!("Listing all songs, page {} limit {}", pagination.page, pagination.limit);
        } else {
            debug!("Listing songs matching {:?}", filter);
        }
        Ok(self.store.list(filter, pagination)?)
    }

    pub fn get_song(&self, id: SongId) -> ServiceResult<Song> {
        Ok(self.store.find_active(id)?)
    }

    pub fn get_song_text(&self, id: SongId) -> ServiceResult<String> {
        Ok(self.store.find_active(id)?.text)
    }

    /// Creates a song enriched from the remote source only.
    pub async fn create_song(&self, request: NewSongRequest) -> ServiceResult<Song> {
        let group = require_non_blank("group", &request.group)?;
        let title = require_non_blank("song", &request.song)?;
        self.create_enriched(group, title).await
    }

    pub fn update_song(&self, id: SongId, update: SongUpdate) -> ServiceResult<Song> {
        let mut song = self.store.find_active(id)?;
        update.apply_to(&mut song);
        let updated = self.store.update(&song)?;
        info!("Updated song {}", id);
        Ok(updated)
    }

    pub fn delete_song(&self, id: SongId) -> ServiceResult<()> {
        self.store.soft_delete(id)?;
        metrics::record_song_deleted();
        info!("Deleted song {}", id);
        Ok(())
    }

    /// Pages through the verses of a song. Soft deleted songs are still served.
    pub fn list_verses(&self, id: SongId, pagination: Pagination) -> ServiceResult<VersePage> {
        let song = self.store.find_any(id)?;
        paginate_verses(song.id, &song.text, pagination.page, pagination.limit).map_err(|err| {
            match err {
                VerseError::NoVerses => debug!("Song {} has no verses", id),
                VerseError::OutOfRange { .. } => debug!("Song {}: {}", id, err),
            }
            ServiceError::NotFound
        })
    }
}
