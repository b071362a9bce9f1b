pub mod config;
mod http_layers;
pub mod metrics;
pub mod mock_metadata;
#[allow(clippy::module_inception)]
pub mod server;
mod song_routes;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use mock_metadata::{make_mock_metadata_app, run_mock_metadata_server};
pub use server::{make_app, make_metrics_app, run_server};
pub(self) use song_routes::make_song_routes;
