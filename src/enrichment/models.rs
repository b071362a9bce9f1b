use serde::{Deserialize, Serialize};

/// Metadata returned by an enrichment source and by the `/info` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDetail {
    #[serde(default, alias = "releaseDate")]
    pub release_date: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
}

/// Body of a metadata service response. Some services wrap the detail in a
/// list, in which case the first element is used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SongDetailPayload {
    // Tried first, a struct with defaulted fields would also accept `[]`.
    List(Vec<SongDetail>),
    Single(SongDetail),
}

impl SongDetailPayload {
    pub(super) fn into_detail(self) -> Option<SongDetail> {
        match self {
            SongDetailPayload::List(details) => details.into_iter().next(),
            SongDetailPayload::Single(detail) => Some(detail),
        }
    }
}

/// Contents of the local enrichment file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub group: String,
    pub song: String,
    #[serde(flatten)]
    pub detail: SongDetail,
}
