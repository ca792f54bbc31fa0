use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};

use crate::cache::store;
use crate::error::SuncacheError;

use super::ListingState;

/// `GET /list-images`: JSON array of cached `*.jpg` basenames.
pub async fn list_images(State(state): State<Arc<ListingState>>) -> Response {
    let dir = state.cache_dir.clone();
    let listed = tokio::task::spawn_blocking(move || store::list_images(&dir))
        .await
        .unwrap_or_else(|e| {
            Err(SuncacheError::DirectoryUnreadable(std::io::Error::other(
                e.to_string(),
            )))
        });

    match listed {
        Ok(names) => {
            tracing::debug!("Files found in cache: {:?}", names);
            (
                StatusCode::OK,
                [(CACHE_CONTROL, "no-cache, must-revalidate")],
                Json(names),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error: {} at {}", e, state.cache_dir.display());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CACHE_CONTROL, "no-cache, must-revalidate")],
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
