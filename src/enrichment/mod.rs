//! Song metadata enrichment.
//!
//! An [`EnrichmentSource`] turns a (group, title) pair into a [`SongDetail`].
//! Two sources exist:
//! - [`RemoteEnrichment`]: queries an external metadata service over HTTP
//! - [`LocalFileEnrichment`]: reads a single record from a JSON file on disk
//!
//! The song service decides which sources to consult for each operation.

mod local_file;
mod models;
mod remote;

pub use local_file::LocalFileEnrichment;
pub use models::{EnrichmentRecord, SongDetail};
pub use remote::RemoteEnrichment;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    /// The source could not produce an answer (transport, status, decoding).
    #[error("enrichment fetch failed: {0}")]
    FetchFailed(String),

    /// The source answered but has nothing for this song.
    #[error("no enrichment available")]
    NotFound,
}

#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn fetch(&self, group: &str, title: &str) -> Result<SongDetail, EnrichmentError>;
}
