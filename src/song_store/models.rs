use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SongId = i64;

/// A persisted song record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the song is soft deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
    pub release_date: String,
    /// Lyrics, verses are separated by a blank line.
    pub text: String,
    pub link: String,
}

/// Fields needed to insert a new song, ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewSong {
    pub group: String,
    pub title: String,
    pub release_date: String,
    pub text: String,
    pub link: String,
}

/// Optional filters for listing songs. Every `Some` filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SongFilter {
    /// Case-insensitive substring of the group name.
    pub group: Option<String>,
    /// Case-insensitive substring of the title.
    #[serde(rename = "song")]
    pub title: Option<String>,
    /// Exact release date.
    pub release_date: Option<String>,
    /// Case-insensitive substring of the lyrics.
    pub text: Option<String>,
    /// Case-insensitive substring of the link.
    pub link: Option<String>,
}

impl SongFilter {
    pub fn is_empty(&self) -> bool {
        [
            &self.group,
            &self.title,
            &self.release_date,
            &self.text,
            &self.link,
        ]
        .iter()
        .all(|f| non_blank(f).is_none())
    }
}

/// Treats empty filter values the same as absent ones.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// A clamped, 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    /// Builds a pagination from raw query values.
    ///
    /// Absent values fall back to the defaults, values that are present but
    /// non-positive or unparsable are clamped to 1.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Pagination {
            page: parse_positive_or_one(page, DEFAULT_PAGE),
            limit: parse_positive_or_one(limit, DEFAULT_PAGE_LIMIT),
        }
    }

    pub fn new(page: usize, limit: usize) -> Self {
        Pagination {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_PAGE, DEFAULT_PAGE_LIMIT)
    }
}

fn parse_positive_or_one(raw: Option<&str>, default: usize) -> usize {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => value as usize,
            _ => 1,
        },
    }
}
