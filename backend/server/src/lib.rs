//! Documentation of a live display broadcasting server.
//!
//! Every tick the server rolls a fresh 12-digit display, compares it with the one cached in Redis, and only when it
//! changed pushes it to every connected screen, caches it, and files it in Meilisearch with an anomaly flag.
//!
//!
//!
//! # General Infrastructure
//! - One server process owns the ticker, the REST routes, and the WebSocket endpoint
//! - Redis holds the single latest display, Meilisearch holds the full history
//! - Screens connect to `/ws` and render whatever arrives, no polling
//! - Ensure Redis and Meilisearch ports are reachable from the server container
//!
//!
//!
//! # Routes
//! - `GET /health`: liveness
//! - `GET /display/current`: cached display, `[]` before the first tick
//! - `GET /display/latest`: newest history record
//! - `GET /display/anomalies?limit=N`: newest anomalous records, default 10, max 100
//! - `DELETE /display`: wipe history
//! - `GET /ws`: live updates
//!
//!
//!
//! # Notes
//!
//! ## Redis + Meilisearch
//! The cache and the history could live in one store. But the ticker reads the latest display every second and
//! only needs one key, which is exactly what Redis is good at. History is append-only and queried by flag and
//! time, which Meilisearch handles with a filterable and a sortable attribute.
//!
//! A tick that broadcasts and then fails to persist leaves clients having seen a display with no history record.
//! We accept that, the next accepted tick carries on as normal.
//!
//!
//!
//! # Setup
//!
//! Run locally.
//! ```sh
//! MEILI_ADMIN_KEY=dev RUST_LOG=info cargo run --bin server
//! ```
//!
//! Environment.
//! - `RUST_PORT`, default `5000`
//! - `REDIS_URL`, default `redis://127.0.0.1:6379`
//! - `MEILI_URL`, default `http://127.0.0.1:7700`
//! - `MEILI_ADMIN_KEY`, from `/run/secrets/MEILI_ADMIN_KEY` or the environment
//! - `TICK_MS`, default `1000`
//! - `BROADCAST_CAPACITY`, default `64`
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod anomaly;
pub mod broadcast;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod history;
pub mod routes;
pub mod socket;
pub mod state;
pub mod ticker;

use config::Config;
use routes::{anomalies_handler, clear_handler, current_handler, health_handler, latest_handler};
use socket::ws_handler;
use state::State;
use ticker::Ticker;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config)
        .await
        .context("Failed to reach Redis or Meilisearch")?;

    info!("Starting ticker...");
    let ticker = Ticker::new(
        state.cache.clone(),
        state.history.clone(),
        state.hub.clone(),
        state.config.tick,
    );
    let ticker_task = tokio::spawn(Arc::new(ticker).run());

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/display", delete(clear_handler))
        .route("/display/current", get(current_handler))
        .route("/display/latest", get(latest_handler))
        .route("/display/anomalies", get(anomalies_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker_task.abort();
    let _ = ticker_task.await;
    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            return std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
