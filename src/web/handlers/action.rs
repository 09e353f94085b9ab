//! Action handler.

use std::io::{Seek, SeekFrom};
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tokio::io::AsyncWriteExt;

use super::{blocking, AppState};
use crate::action::{ActionKind, ActionRequest, UploadedFile};
use crate::web::dto::{ActionResponse, ApiResponse};
use crate::web::error::ApiError;

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::debug!("Failed to read multipart field: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body too large")
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

fn spool_error(e: std::io::Error) -> ApiError {
    tracing::error!("Failed to spool upload: {}", e);
    ApiError::internal("Failed to receive file")
}

/// Copy one multipart file field into an anonymous temp file.
///
/// The field is consumed chunk by chunk; the returned upload reads back from
/// the start of the temp file.
async fn spool(
    name: String,
    field: &mut axum::extract::multipart::Field<'_>,
) -> Result<UploadedFile, ApiError> {
    let file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(|e| spool_error(std::io::Error::other(e)))?
        .map_err(spool_error)?;
    let mut file = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        file.write_all(&chunk).await.map_err(spool_error)?;
    }
    file.flush().await.map_err(spool_error)?;

    let mut file = file.into_std().await;
    file.seek(SeekFrom::Start(0)).map_err(spool_error)?;
    Ok(UploadedFile::new(name, size, file))
}

/// POST /api/action - Run one file manager action.
///
/// Multipart fields: `action`, `path`, `name`, `current_path`,
/// `file_or_dir` (`file` or `dir`) and any number of `ufile` files. The
/// response carries the outcome messages and a fresh tree focused on
/// `current_path`.
pub async fn post_action(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ActionResponse>>, ApiError> {
    let mut action: Option<String> = None;
    let mut path = String::new();
    let mut name: Option<String> = None;
    let mut current_path = "/".to_string();
    let mut is_directory = false;
    let mut files = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "ufile" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                // browsers send an empty part when no file was chosen
                if file_name.is_empty() {
                    continue;
                }
                files.push(spool(file_name, &mut field).await?);
            }
            "action" => action = Some(field.text().await.map_err(multipart_error)?),
            "path" => path = field.text().await.map_err(multipart_error)?,
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "current_path" => current_path = field.text().await.map_err(multipart_error)?,
            "file_or_dir" => {
                is_directory = field.text().await.map_err(multipart_error)? == "dir";
            }
            _ => {}
        }
    }

    let kind: ActionKind = action
        .ok_or_else(|| ApiError::bad_request("Missing action"))?
        .parse()
        .map_err(|e: crate::action::UnknownAction| ApiError::bad_request(e.to_string()))?;

    let mut request = ActionRequest::new(kind, path).with_current_path(current_path.clone());
    request.name = name;
    request.is_directory = is_directory;
    request.files = files;

    let response = blocking(move || {
        let report = state.engine.execute(request);
        let tree = state.tree_response(&current_path);
        ActionResponse::new(report, tree)
    })
    .await?;

    Ok(Json(ApiResponse::new(response)))
}
