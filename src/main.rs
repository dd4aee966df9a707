use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graphlens::api::{self, handlers::AppState};
use graphlens::embeddings::{GraphEmbedder, HashEmbedder};
use graphlens::engine::EngineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphlens=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GraphLens analysis service...");

    let config = EngineConfig::from_env();
    config.validate()?;

    let embedder = HashEmbedder::from_env();
    info!(
        provider = embedder.provider_name(),
        dimension = embedder.dimension(),
        threshold = config.fixed_threshold,
        "engine configured"
    );

    let state = Arc::new(AppState {
        embedder: Arc::new(embedder),
        config,
    });

    // permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    // layers apply bottom-up: CORS runs first on incoming requests
    let app = api::routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "5001".to_string())
        .parse()
        .unwrap_or(5001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("GraphLens API server starting on http://{}", addr);
    api::routes::print_routes();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("GraphLens shut down gracefully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install CTRL+C signal handler");
        return;
    }
    info!("Shutdown signal received...");
}
