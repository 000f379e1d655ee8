//! Documentation of a social media analytics service.
//!
//! Serves ranked views over users, posts and comments held by an external
//! collaborator, recomputing them on a schedule and caching them in between.
//!
//!
//!
//! # General Infrastructure
//! - Clients only ever talk to this server, never to the collaborator
//! - The collaborator requires a session token exchanged from static credentials
//! - Every view is served from the store when fresh, computed on demand otherwise
//! - Background jobs keep the token and every view warm
//!
//!
//!
//! # Endpoints
//!
//! | Route                     | View             | TTL default |
//! |---------------------------|------------------|-------------|
//! | `GET /users`              | top 5 by posts   | 300s        |
//! | `GET /posts?type=latest`  | 5 newest posts   | 60s         |
//! | `GET /posts?type=popular` | most commented   | 60s         |
//!
//! Bodies are bare JSON arrays, errors are `{"error": "..."}`.
//!
//!
//!
//! # Notes
//!
//! ## Consistency
//! Views are eventually consistent with the collaborator. Between refreshes a
//! client can read a view up to one TTL old. Fan-out runs sequentially unless
//! `FETCH_CONCURRENCY` says otherwise, the collaborator is assumed to be slow
//! and rate sensitive.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against the mock collaborator.
//! ```sh
//! cargo run -p tester
//! CLIENT_ID=demo CLIENT_SECRET=demo cargo run -p pulse
//! ```
//!
//! Compute a single view without serving.
//! ```sh
//! CLIENT_ID=demo CLIENT_SECRET=demo cargo run -p process -- --view popular
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use process::models::ViewKind;
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod jobs;
pub mod refresh;
pub mod routes;
pub mod state;

use config::Config;
use jobs::{Jobs, RefreshJob};
use refresh::Orchestrator;
use routes::{posts_handler, users_handler};
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    let jobs = Jobs::new();
    jobs.register("token", state.tokens.spawn_renewal());
    for kind in ViewKind::ALL {
        let job = RefreshJob::new(kind, state.orchestrator.clone());
        jobs.register(job.name(), job.spawn());
    }
    info!(jobs = ?jobs.names(), "Background jobs started");

    info!("Starting server...");
    let app = app(state.orchestrator.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    jobs.shutdown();

    Ok(())
}

pub fn app(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/users", get(users_handler))
        .route("/posts", get(posts_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(orchestrator)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
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
