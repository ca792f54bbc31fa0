// Listing server.
// Serves the cache directory contents as a JSON array over HTTP.

pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, http::Method, routing::get};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::Result;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";

/// Shared state for listing handlers.
#[derive(Debug, Clone)]
pub struct ListingState {
    pub cache_dir: PathBuf,
}

/// Build the listing router for a cache directory.
pub fn router(cache_dir: PathBuf) -> Router {
    let state = Arc::new(ListingState { cache_dir });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(routes::list_images))
        .route("/list-images", get(routes::list_images))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the listing until Ctrl-C.
pub async fn serve(cache_dir: PathBuf, bind_address: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(
        "Listing {} on http://{}",
        cache_dir.display(),
        listener.local_addr()?
    );

    axum::serve(listener, router(cache_dir))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received, shutting down");
            }
        })
        .await?;

    Ok(())
}
