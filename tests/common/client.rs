//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all tunes-server endpoints.
//!
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use std::fmt::Display;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Server
    // ========================================================================

    pub async fn get_home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Get-or-create
    // ========================================================================

    pub async fn get_info(&self, group: &str, song: &str) -> Response {
        self.get_info_with_query(&[("group", group), ("song", song)])
            .await
    }

    pub async fn get_info_with_query(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/info"))
            .query(query)
            .send()
            .await
            .expect("Info request failed")
    }

    // ========================================================================
    // Songs
    // ========================================================================

    pub async fn list_songs(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/songs"))
            .query(query)
            .send()
            .await
            .expect("List songs request failed")
    }

    pub async fn get_song(&self, id: impl Display) -> Response {
        self.client
            .get(self.url(&format!("/songs/{}", id)))
            .send()
            .await
            .expect("Get song request failed")
    }

    pub async fn get_song_text(&self, id: impl Display) -> Response {
        self.client
            .get(self.url(&format!("/songs/{}/text", id)))
            .send()
            .await
            .expect("Get song text request failed")
    }

    pub async fn get_song_verses(&self, id: impl Display, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url(&format!("/songs/{}/verses", id)))
            .query(query)
            .send()
            .await
            .expect("Get verses request failed")
    }

    pub async fn post_song(&self, body: serde_json::Value) -> Response {
        self.client
            .post(self.url("/songs"))
            .json(&body)
            .send()
            .await
            .expect("Post song request failed")
    }

    /// Sends `body` verbatim as a JSON request body
    pub async fn post_song_raw(&self, body: &'static str) -> Response {
        self.client
            .post(self.url("/songs"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Post song request failed")
    }

    pub async fn put_song(&self, id: impl Display, body: serde_json::Value) -> Response {
        self.client
            .put(self.url(&format!("/songs/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Put song request failed")
    }

    pub async fn delete_song(&self, id: impl Display) -> Response {
        self.client
            .delete(self.url(&format!("/songs/{}", id)))
            .send()
            .await
            .expect("Delete song request failed")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Creates a song through `POST /songs` and returns its id
    pub async fn create_song(&self, group: &str, song: &str) -> i64 {
        let response = self
            .post_song(serde_json::json!({ "group": group, "song": song }))
            .await;
        assert!(
            response.status().is_success(),
            "Song creation failed: {:?}",
            response.status()
        );
        let song: serde_json::Value = response.json().await.expect("Invalid song body");
        song["id"].as_i64().expect("Song has no id")
    }

    /// Creates a song and replaces its lyrics
    pub async fn create_song_with_text(&self, group: &str, song: &str, text: &str) -> i64 {
        let id = self.create_song(group, song).await;
        let response = self.put_song(id, serde_json::json!({ "text": text })).await;
        assert!(response.status().is_success(), "Setting song text failed");
        id
    }
}
