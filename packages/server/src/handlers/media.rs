use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Stream a stored image. The path is the asset's `file_path` as returned in
/// entry responses; anything outside the image store root is a 404.
#[instrument(skip(state))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let absolute = state
        .images
        .resolve(&path)
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let file = match tokio::fs::File::open(&absolute).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found".into()));
        }
        Err(e) => return Err(AppError::Internal(format!("Failed to open media file: {e}"))),
    };

    let metadata = file
        .metadata()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stat media file: {e}")))?;
    if !metadata.is_file() {
        return Err(AppError::NotFound("File not found".into()));
    }

    let content_type = mime_guess::from_path(&absolute)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len().to_string())
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
