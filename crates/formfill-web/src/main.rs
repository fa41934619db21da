use std::net::SocketAddr;
use std::sync::Arc;

mod handlers;
mod models;
mod state;

use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;

use formfill_core::Settings;
use formfill_extract::ExtractionEngine;
use formfill_match::{FieldMatcher, OpenAiClient};
use state::AppState;

fn app(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(handlers::health::health))
        .route(
            "/process-file",
            axum::routing::post(handlers::process::process_file),
        )
        // Alias kept for extension builds that predate multi-format support.
        .route(
            "/process-pdf",
            axum::routing::post(handlers::process::process_file),
        )
        .route(
            "/capabilities",
            axum::routing::get(handlers::capabilities::capabilities),
        )
        // Uploads arrive base64-inflated inside the JSON body (50MB).
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        // Callers are browser extensions on arbitrary origins.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load();
    let engine = Arc::new(ExtractionEngine::from_settings(&settings));
    let client = Arc::new(OpenAiClient::new(&settings)?);
    let matcher = FieldMatcher::new(client, settings.openai_api_key.clone());

    let state = Arc::new(AppState {
        engine,
        matcher,
        default_mode: settings.default_mode,
    });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
