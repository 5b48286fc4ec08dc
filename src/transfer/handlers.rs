use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Extension, Multipart, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use futures::StreamExt;

use super::download::{DownloadCoordinator, DownloadError};
use super::protocol::{ENDPOINT_DOWNLOAD, ENDPOINT_UPLOAD, UploadResponse};
use super::upload::{MAX_UPLOAD_BYTES, UploadCoordinator, UploadError};

/// Builds the HTTP surface over the two coordinators.
pub fn router(uploads: Arc<UploadCoordinator>, downloads: Arc<DownloadCoordinator>) -> Router {
    Router::new()
        .route(ENDPOINT_UPLOAD, put(handle_upload))
        .route(ENDPOINT_DOWNLOAD, get(handle_download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(uploads))
        .layer(Extension(downloads))
}

pub async fn handle_upload(
    Extension(uploads): Extension<Arc<UploadCoordinator>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), (StatusCode, String)> {
    let mut field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            return Err((StatusCode::BAD_REQUEST, "file field is expected".to_string()));
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to parse multipart request");
            return Err((StatusCode::BAD_REQUEST, "invalid multipart request".to_string()));
        }
    };

    if field.name() != Some("file") {
        return Err((StatusCode::BAD_REQUEST, "file field is expected".to_string()));
    }

    let file_name = field
        .file_name()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "upload.bin".to_string());
    let content_type = field
        .content_type()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let body = async_stream::stream! {
        loop {
            match field.chunk().await {
                Ok(Some(data)) => yield Ok(data),
                Ok(None) => break,
                Err(err) => {
                    yield Err(err);
                    break;
                }
            }
        }
    };

    match uploads
        .store_stream(&file_name, &content_type, Box::pin(body))
        .await
    {
        Ok(record) => Ok((
            StatusCode::OK,
            Json(UploadResponse {
                stored: true,
                file_name: record.file_name,
                chunks: record.chunks.len(),
            }),
        )),
        Err(err @ UploadError::Input(_)) => Err((StatusCode::BAD_REQUEST, err.to_string())),
        Err(err @ UploadError::Storage) => {
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}

pub async fn handle_download(
    Extension(downloads): Extension<Arc<DownloadCoordinator>>,
    Path(file_name): Path<String>,
) -> Response {
    let (record, mut chunk_stream) = match downloads.open(&file_name) {
        Ok(opened) => opened,
        Err(err) => return (StatusCode::NOT_FOUND, err.to_string()).into_response(),
    };

    let headers = [
        ("Content-Type", record.content_type.clone()),
        ("Content-Length", record.size.to_string()),
        (
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", record.file_name),
        ),
    ];

    // Resolve the first chunk before answering so a file whose very first
    // chunk cannot be served still gets a clean 404. Later failures happen
    // mid-body and can only terminate the stream early.
    match chunk_stream.next().await {
        None => (StatusCode::OK, headers, Body::empty()).into_response(),
        Some(Err(err)) => {
            tracing::error!(file_name = %file_name, error = %err, "download failed before first byte");
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        Some(Ok(first)) => {
            let payloads = futures::stream::once(async move { Ok::<_, DownloadError>(first) })
                .chain(chunk_stream);
            (StatusCode::OK, headers, Body::from_stream(payloads)).into_response()
        }
    }
}
