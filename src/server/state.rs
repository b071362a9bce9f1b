use axum::extract::FromRef;

use crate::song_service::SongService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSongService = Arc<SongService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub song_service: GuardedSongService,
}

impl ServerState {
    pub fn new(config: ServerConfig, song_service: SongService) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            song_service: Arc::new(song_service),
        }
    }
}

impl FromRef<ServerState> for GuardedSongService {
    fn from_ref(input: &ServerState) -> Self {
        input.song_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
