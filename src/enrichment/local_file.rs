use super::models::{EnrichmentRecord, SongDetail};
use super::{EnrichmentError, EnrichmentSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Enrichment backed by a single JSON record on disk.
///
/// The file is read on every lookup so it can be edited while the server runs.
pub struct LocalFileEnrichment {
    path: PathBuf,
}

impl LocalFileEnrichment {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<EnrichmentRecord, EnrichmentError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EnrichmentError::FetchFailed(format!("could not read {:?}: {}", self.path, e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            EnrichmentError::FetchFailed(format!("could not parse {:?}: {}", self.path, e))
        })
    }
}

#[async_trait]
impl EnrichmentSource for LocalFileEnrichment {
    fn name(&self) -> &'static str {
        "local_file"
    }

    async fn fetch(&self, group: &str, title: &str) -> Result<SongDetail, EnrichmentError> {
        let record = self.read_record().await?;
        if record.group == group && record.song == title {
            Ok(record.detail)
        } else {
            Err(EnrichmentError::NotFound)
        }
    }
}
