use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{log_requests, make_song_routes, metrics, state::*, ServerConfig};
use crate::song_service::SongService;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(stats)
}

fn make_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn make_app(config: ServerConfig, song_service: SongService) -> Router {
    let state = ServerState::new(config.clone(), song_service);

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut app: Router = home_router.merge(make_song_routes(state.clone()));

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));
    if config.cors_allow_all {
        app = app.layer(make_cors_layer());
    }

    app
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(
    song_service: SongService,
    config: ServerConfig,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, song_service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::try_join!(
        axum::serve(listener, app).into_future(),
        axum::serve(metrics_listener, make_metrics_app()).into_future(),
    )?;
    Ok(())
}
