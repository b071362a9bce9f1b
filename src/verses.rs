//! Splitting lyrics into verses and paging through them.

use crate::song_store::SongId;
use serde::Serialize;
use thiserror::Error;

const VERSE_DELIMITER: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersePage {
    pub song_id: SongId,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub verses: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerseError {
    #[error("song has no verses")]
    NoVerses,

    #[error("page {page} is out of range ({total_pages} pages)")]
    OutOfRange { page: usize, total_pages: usize },
}

/// Verses of `text`, in order. Blank text has no verses.
pub fn split_verses(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    if normalized.trim().is_empty() {
        return Vec::new();
    }
    normalized
        .split(VERSE_DELIMITER)
        .map(str::to_string)
        .collect()
}

/// Returns the `page`-th window of `limit` verses.
///
/// `page` and `limit` are clamped to at least 1. A page starting past the last
/// verse is an error, never an empty page.
pub fn paginate_verses(
    song_id: SongId,
    text: &str,
    page: usize,
    limit: usize,
) -> Result<VersePage, VerseError> {
    let page = page.max(1);
    let limit = limit.max(1);

    let verses = split_verses(text);
    let total = verses.len();
    if total == 0 {
        return Err(VerseError::NoVerses);
    }
    let total_pages = total.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    if start >= total {
        return Err(VerseError::OutOfRange { page, total_pages });
    }
    let end = (start + limit).min(total);

    Ok(VersePage {
        song_id,
        page,
        limit,
        total,
        total_pages,
        verses: verses[start..end].to_vec(),
    })
}
