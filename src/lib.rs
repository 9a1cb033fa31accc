//! Hope & Fear Forecast backend.
//!
//! Visitors place characters on a hope/fear × likely/unlikely grid. This
//! service stores each finished forecast, keeps contact details apart from
//! predictions, counts a handful of page events, and serves the community
//! comparison shown on the thank-you page.

pub mod config;
pub mod counters;
pub mod db;
pub mod error;
pub mod survey;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde_json::{json, Value};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

use config::Config;
use counters::handlers::{get_counters_handler, record_event_handler};
use db::Database;
use survey::{
    builder::SubmissionPolicy,
    catalog::Catalog,
    handlers::{
        aggregated_predictions_handler, average_predictions_handler, comparison_handler,
        list_items_handler, save_predictions_handler,
    },
};

pub struct AppState {
    pub db: Database,
    pub catalog: Catalog,
    pub policy: SubmissionPolicy,
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_router(state: Arc<AppState>, cors_max_age: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(cors_max_age);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/items", get(list_items_handler))
        .route("/api/predictions", post(save_predictions_handler))
        .route("/api/predictions/averages", get(average_predictions_handler))
        .route("/api/predictions/aggregated", get(aggregated_predictions_handler))
        .route("/api/comparison", get(comparison_handler))
        .route("/api/events/{event}", post(record_event_handler))
        .route("/api/counters", get(get_counters_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Forecast starting up...");

    let config = Config::load()?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::default(),
    };
    info!("Loaded {} catalog items", catalog.items().len());

    let database = Database::new(config.db_path.clone())?;

    let state = Arc::new(AppState {
        db: database,
        catalog,
        policy: SubmissionPolicy {
            require_email: config.require_email,
        },
    });

    let app = build_router(state, Duration::from_secs(config.cors_max_age_secs));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                error!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install signal handler: {err}");
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
