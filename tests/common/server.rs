//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database, its own mock
//! metadata service and, optionally, its own enrichment file.

use super::constants::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tunes_server::enrichment::{EnrichmentSource, LocalFileEnrichment, RemoteEnrichment};
use tunes_server::server::{make_app, make_mock_metadata_app, RequestsLoggingLevel, ServerConfig};
use tunes_server::song_service::SongService;
use tunes_server::song_store::SqliteSongStore;

#[derive(Default)]
pub struct TestServerOptions {
    /// Written to the enrichment file consulted after get-or-create.
    /// No enrichment file is configured when `None`.
    pub enrichment_file_content: Option<String>,

    /// Point the server at a metadata URL where nothing is listening.
    pub metadata_unreachable: bool,
}

/// Test server instance with isolated database
///
/// When dropped, the servers gracefully shut down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Song store for direct database access in tests
    pub store: Arc<SqliteSongStore>,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_txs: Vec<tokio::sync::oneshot::Sender<()>>,
}

fn serve_until_shutdown(
    listener: TcpListener,
    app: axum::Router,
) -> tokio::sync::oneshot::Sender<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
    });
    shutdown_tx
}

impl TestServer {
    /// Spawns a test server backed by the mock metadata service
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, a port cannot be bound or the
    /// server doesn't become ready within timeout.
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut shutdown_txs = Vec::new();

        let metadata_listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind metadata port");
        let metadata_url = format!(
            "http://{}",
            metadata_listener
                .local_addr()
                .expect("Failed to get metadata address")
        );
        if options.metadata_unreachable {
            drop(metadata_listener);
        } else {
            shutdown_txs.push(serve_until_shutdown(
                metadata_listener,
                make_mock_metadata_app(),
            ));
        }

        let store = Arc::new(
            SqliteSongStore::new(temp_dir.path().join("songs.db"))
                .expect("Failed to open song store"),
        );

        let remote: Arc<dyn EnrichmentSource> =
            Arc::new(RemoteEnrichment::new(&metadata_url, 2).expect("Failed to build client"));

        let overlay: Option<Arc<dyn EnrichmentSource>> =
            options.enrichment_file_content.map(|content| {
                let path = temp_dir.path().join("song_enrichment.json");
                std::fs::write(&path, content).expect("Failed to write enrichment file");
                Arc::new(LocalFileEnrichment::new(path)) as Arc<dyn EnrichmentSource>
            });

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            cors_allow_all: true,
        };
        let app = make_app(config, SongService::new(store.clone(), remote, overlay));
        shutdown_txs.push(serve_until_shutdown(listener, app));

        let server = Self {
            base_url,
            port,
            store,
            _temp_dir: temp_dir,
            _shutdown_txs: shutdown_txs,
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for tx in self._shutdown_txs.drain(..) {
            let _ = tx.send(());
        }
    }
}
