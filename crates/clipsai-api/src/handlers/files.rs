//! Range-aware static file handlers.

use std::path::{Component, Path as FsPath, PathBuf};

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::Response;
use futures_util::stream;
use tokio::io::{AsyncReadExt, DuplexStream};
use tracing::debug;

use clipsai_media::serve::CHUNK_SIZE;
use clipsai_media::{open_ranged, StreamStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Resolve a request path under `root`, rejecting anything but plain names.
fn resolve_under(root: &FsPath, requested: &str) -> ApiResult<PathBuf> {
    let relative = FsPath::new(requested);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if requested.is_empty() || requested.contains('\\') || !plain {
        return Err(ApiError::bad_request("Invalid file path"));
    }
    Ok(root.join(relative))
}

/// Body stream over the read half of the pipe the file is served into.
fn pipe_body(reader: DuplexStream) -> Body {
    let chunks = stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        match reader.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some(reader)))
            }
            Err(e) => Some((Err(e), None)),
        }
    });
    Body::from_stream(chunks)
}

/// Answer with the headers a GET would get. HEAD requests skip the body.
async fn serve_file(
    root: &FsPath,
    requested: &str,
    method: &Method,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let path = resolve_under(root, requested)?;
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let file = open_ranged(&path, range).await?;
    let plan = file.plan.clone();

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(plan.status).unwrap_or(StatusCode::OK))
        .header(header::CONTENT_TYPE, file.content_type)
        .header(header::CONTENT_LENGTH, plan.content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header("Cross-Origin-Resource-Policy", "cross-origin");
    if let Some(content_range) = &plan.content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    if *method == Method::HEAD {
        return builder
            .body(Body::empty())
            .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")));
    }

    let (mut writer, reader) = tokio::io::duplex(CHUNK_SIZE * 4);
    tokio::spawn(async move {
        let path = file.path.clone();
        let outcome = file.serve_into(&mut writer).await;
        if outcome.status != StreamStatus::Failed {
            debug!(
                path = %path.display(),
                status = outcome.status.as_str(),
                bytes = outcome.bytes_written,
                "Stream finished"
            );
        }
    });

    builder
        .body(pipe_body(reader))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// Serve a source video from the upload directory.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_file(&state.config.upload_dir, &path, &method, &headers).await
}

/// Serve a finished clip from the download directory.
pub async fn serve_download(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_file(&state.config.download_dir, &path, &method, &headers).await
}

/// Serve a public scratch file.
pub async fn serve_tmp(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_file(&state.config.tmp_dir, &path, &method, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_under_accepts_nested_names() {
        let path = resolve_under(FsPath::new("downloads"), "a/clip.mp4").unwrap();
        assert_eq!(path, PathBuf::from("downloads/a/clip.mp4"));
    }

    #[test]
    fn test_resolve_under_rejects_traversal() {
        let root = FsPath::new("downloads");
        assert!(resolve_under(root, "../secret").is_err());
        assert!(resolve_under(root, "a/../../secret").is_err());
        assert!(resolve_under(root, "/etc/passwd").is_err());
        assert!(resolve_under(root, "a\\..\\b").is_err());
        assert!(resolve_under(root, "").is_err());
    }
}
