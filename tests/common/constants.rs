//! Shared constants for end-to-end tests
//!
//! When test data changes, update only this file.

#![allow(dead_code, unused_imports)]

// ============================================================================
// Test Songs
// ============================================================================

/// Group used by most scenarios
pub const GROUP: &str = "Muse";

/// Title used by most scenarios
pub const TITLE: &str = "Supermassive Black Hole";

/// A second title by the same group
pub const OTHER_TITLE: &str = "Starlight";

/// Lyrics with three verses
pub const THREE_VERSES: &str = "verse1\n\nverse2\n\nverse3";

/// Detail served by the mock metadata service for any song
pub use tunes_server::server::mock_metadata::{MOCK_LINK, MOCK_RELEASE_DATE, MOCK_TEXT};

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for a test server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Timeout for every request made by the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
