use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::api::error::AppError;
use crate::services::merge::Sink;
use crate::services::workspace::{UploadedFile, Workspace};

/// Multipart field name carrying the uploaded documents
const FILES_FIELD: &str = "files";

/// `POST /merge_pdfs`: concatenate the uploaded PDFs, in submission order,
/// into one document returned as a download.
pub async fn merge_pdfs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut uploads: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        uploads.push(UploadedFile { filename, content });
    }

    // Fast-fail before any workspace exists
    if uploads.is_empty() {
        return Err(AppError::NoFilesUploaded);
    }

    tracing::debug!(
        files = ?uploads.iter().map(|f| f.filename.as_str()).collect::<Vec<_>>(),
        "files received"
    );

    let workspace = match &state.config.staging_dir {
        Some(root) => Workspace::create_in(root)?,
        None => Workspace::create()?,
    };

    let staged = workspace.stage(&uploads).await?;
    let merged = state.merger.merge(&staged, Sink::Memory).await?;
    let bytes = merged.into_bytes()?;

    // Staged files are no longer needed once the merged bytes are fully
    // materialized; dropping the workspace removes them before the response
    // starts streaming.
    drop(workspace);

    let headers = [
        (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"merged.pdf\"".to_string(),
        ),
    ];

    Ok((headers, bytes).into_response())
}
