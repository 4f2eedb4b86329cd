//! Attachment endpoints: fetch-through download, upload, delete.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use pantry_core::{filename, sync};
use serde_json::json;

const OCTET_STREAM: &str = "application/octet-stream";

fn attachment_not_found() -> ApiError {
    ApiError::NotFound("attachment not found".to_string())
}

fn package_not_found() -> ApiError {
    ApiError::NotFound("package not found".to_string())
}

/// GET /{package}/-/{attachment} - Serve an artifact, fetching it from
/// its origin on a miss.
pub async fn download(
    State(state): State<AppState>,
    Path((package, attachment)): Path<(String, String)>,
) -> ApiResult<Response> {
    tracing::info!(%package, %attachment, "GET attachment");

    filename::validate(&attachment).map_err(|_| attachment_not_found())?;

    let Some(mut meta) = state.registry.get_package(&package).await? else {
        return Err(package_not_found());
    };

    if state.store.exists(&package, &attachment).await? {
        return serve_artifact(&state, &package, &attachment).await;
    }

    let Some(record) = meta.attachments.get(&attachment).cloned() else {
        return Err(attachment_not_found());
    };
    if !state.config.forwarder.auto_forward {
        tracing::debug!(%package, %attachment, "miss with auto-forward disabled");
        return Err(attachment_not_found());
    }

    let _guard = state.inflight.acquire(&package, &attachment).await;
    // A request that was holding the lock may have completed the fetch
    // while we waited.
    if !state.store.exists(&package, &attachment).await? {
        let dest = state.store.artifact_path(&package, &attachment).await?;
        state.fetcher.fetch(&record.forward_url, &dest).await?;

        if let Some(rec) = meta.attachments.get_mut(&attachment) {
            rec.cached = true;
        }
        state.registry.set_package(&meta).await?;
    }

    serve_artifact(&state, &package, &attachment).await
}

/// PUT /{package}/-/{attachment} - Store an uploaded artifact.
///
/// The body must be `application/octet-stream` and is streamed straight
/// into the store. If the package is known, its metadata is
/// resynchronized afterwards; the handler never invents a package record.
pub async fn attach(
    State(state): State<AppState>,
    Path((package, attachment)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<Response> {
    tracing::info!(%package, %attachment, "PUT attachment");

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if content_type != Some(OCTET_STREAM) {
        return Err(ApiError::WrongContent(
            "content-type MUST be application/octet-stream".to_string(),
        ));
    }

    filename::validate(&attachment).map_err(|_| attachment_not_found())?;

    let path = state.store.artifact_path(&package, &attachment).await?;
    let mut upload = state.store.put_stream(&package, &attachment).await?;
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let data = match chunk {
            Ok(data) => data,
            Err(e) => {
                let _ = upload.abort().await;
                return Err(ApiError::Internal(format!(
                    "failed to read request body: {e}"
                )));
            }
        };
        if let Err(e) = upload.write(data).await {
            let _ = upload.abort().await;
            return Err(e.into());
        }
    }
    upload.finish().await?;

    refresh_package(&state, &package).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "id": path.display().to_string(),
            "rev": "1",
        })),
    )
        .into_response())
}

/// DELETE /{package}/-/{attachment} - Remove a cached artifact.
pub async fn detach(
    State(state): State<AppState>,
    Path((package, attachment)): Path<(String, String)>,
) -> ApiResult<Response> {
    tracing::info!(%package, %attachment, "DELETE attachment");

    filename::validate(&attachment).map_err(|_| attachment_not_found())?;

    let Some(mut meta) = state.registry.get_package(&package).await? else {
        return Err(package_not_found());
    };

    if !state.store.exists(&package, &attachment).await? {
        return Err(attachment_not_found());
    }

    state.store.delete(&package, &attachment).await?;

    let pkg_dir = state.store.package_dir(&package).await?;
    sync::refresh(&mut meta, &pkg_dir, &state.config.server);
    state.registry.set_package(&meta).await?;

    Ok((StatusCode::OK, Json(json!({"ok": true}))).into_response())
}

/// Stream a cached artifact back to the client.
async fn serve_artifact(state: &AppState, package: &str, attachment: &str) -> ApiResult<Response> {
    let size = state.store.head(package, attachment).await?;
    let stream = state.store.get_stream(package, attachment).await?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, OCTET_STREAM.to_string()),
            (CONTENT_LENGTH, size.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{attachment}\""),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Resynchronize a package's metadata after a cache mutation.
async fn refresh_package(state: &AppState, package: &str) -> ApiResult<()> {
    match state.registry.get_package(package).await? {
        Some(mut meta) => {
            let pkg_dir = state.store.package_dir(package).await?;
            sync::refresh(&mut meta, &pkg_dir, &state.config.server);
            state.registry.set_package(&meta).await?;
        }
        None => {
            tracing::warn!(%package, "attachment stored for unknown package, metadata not synchronized");
        }
    }
    Ok(())
}
