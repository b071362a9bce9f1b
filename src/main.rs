use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tunes_server::config;
use tunes_server::enrichment::{EnrichmentSource, LocalFileEnrichment, RemoteEnrichment};
use tunes_server::server::{metrics, run_mock_metadata_server, run_server, RequestsLoggingLevel};
use tunes_server::server::ServerConfig;
use tunes_server::song_service::SongService;
use tunes_server::song_store::{SongStore, SqliteSongStore};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite songs database file, created if missing.
    #[clap(long, value_parser = parse_path, default_value = "songs.db")]
    pub db_path: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the external song metadata service.
    #[clap(long, default_value = "http://localhost:8081")]
    pub metadata_url: String,

    /// Timeout in seconds for metadata service requests.
    #[clap(long, default_value_t = 10)]
    pub metadata_timeout_sec: u64,

    /// JSON file whose record overrides get-or-create responses for a matching song.
    #[clap(long, default_value = "song_enrichment.json")]
    pub enrichment_file: PathBuf,

    /// Do not consult the enrichment file at all.
    #[clap(long)]
    pub disable_enrichment_file: bool,

    /// Also serve a mock metadata service on this port.
    #[clap(long)]
    pub mock_metadata_port: Option<u16>,

    /// Allow cross-origin requests from any origin.
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub cors_allow_all: bool,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            metadata_url: args.metadata_url.clone(),
            metadata_timeout_sec: args.metadata_timeout_sec,
            enrichment_file: args.enrichment_file.clone(),
            disable_enrichment_file: args.disable_enrichment_file,
            mock_metadata_port: args.mock_metadata_port,
            cors_allow_all: args.cors_allow_all,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  port: {}", app_config.port);
    info!("  metadata_url: {}", app_config.metadata_url);

    let song_store = Arc::new(
        SqliteSongStore::new(&app_config.db_path)
            .with_context(|| format!("Failed to open songs database {:?}", app_config.db_path))?,
    );

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_library_metrics(song_store.count_active()?);

    let remote: Arc<dyn EnrichmentSource> = Arc::new(RemoteEnrichment::new(
        &app_config.metadata_url,
        app_config.metadata_timeout_sec,
    )?);

    let overlay: Option<Arc<dyn EnrichmentSource>> =
        app_config.enrichment_file.as_ref().map(|path| {
            if !path.exists() {
                warn!(
                    "Enrichment file {:?} does not exist yet, lookups will be skipped until it does",
                    path
                );
            }
            info!("Enrichment file configured at {:?}", path);
            Arc::new(LocalFileEnrichment::new(path)) as Arc<dyn EnrichmentSource>
        });

    if let Some(port) = app_config.mock_metadata_port {
        tokio::spawn(async move {
            if let Err(err) = run_mock_metadata_server(port).await {
                error!("Mock metadata server stopped: {:#}", err);
            }
        });
    }

    let song_service = SongService::new(song_store, remote, overlay);
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        cors_allow_all: app_config.cors_allow_all,
    };

    tokio::select! {
        result = run_server(song_service, server_config, app_config.metrics_port) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
