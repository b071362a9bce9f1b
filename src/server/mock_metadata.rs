//! Stand-in for the external metadata service, for local runs and tests.

use anyhow::{Context, Result};
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const MOCK_RELEASE_DATE: &str = "2024-01-01";
pub const MOCK_TEXT: &str = "This is a sample song text.";
pub const MOCK_LINK: &str = "http://example.com/song";

#[derive(Deserialize, Debug)]
struct InfoQuery {
    group: Option<String>,
    song: Option<String>,
}

async fn info(Query(query): Query<InfoQuery>) -> Response {
    match (query.group, query.song) {
        (Some(group), Some(song)) if !group.is_empty() && !song.is_empty() => Json(json!({
            "group": group,
            "song": song,
            "release_date": MOCK_RELEASE_DATE,
            "text": MOCK_TEXT,
            "link": MOCK_LINK,
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing parameters" })),
        )
            .into_response(),
    }
}

pub fn make_mock_metadata_app() -> Router {
    Router::new().route("/info", get(info))
}

pub async fn run_mock_metadata_server(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind mock metadata server on port {}", port))?;
    info!("Mock metadata server listening on port {}", port);
    axum::serve(listener, make_mock_metadata_app()).await?;
    Ok(())
}
