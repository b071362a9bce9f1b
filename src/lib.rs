//! Tunes Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod enrichment;
pub mod server;
pub mod song_service;
pub mod song_store;
pub mod sqlite_persistence;
pub mod verses;

// Re-export commonly used types for convenience
pub use enrichment::{EnrichmentSource, LocalFileEnrichment, RemoteEnrichment};
pub use server::{run_server, RequestsLoggingLevel};
pub use song_service::SongService;
pub use song_store::{SongStore, SqliteSongStore};
