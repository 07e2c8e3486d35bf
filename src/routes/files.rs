use axum::Json;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::files;
use crate::models::{FileStatus, ManagedFile, NewFile, file::guess_mime};
use crate::state::SharedState;

const UPLOAD_DIRECTORY: &str = "private://uploads";

#[derive(Deserialize)]
pub struct RetrieveQuery {
    pub file: Option<String>,
}

/// Stores uploaded documents as temporary files. Submissions reference them
/// by the returned ids.
pub async fn upload(
    State(state): State<SharedState>,
    user: Option<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut uploaded: Vec<ManagedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let Some(filename) = field.file_name().map(|name| files::basename(name).to_string()) else {
            continue;
        };
        if !files::is_safe_segment(&filename) {
            return Err(AppError::BadRequest(format!("Invalid file name: {filename}")));
        }
        let filemime = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime(&filename).to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;

        let uri = format!("{UPLOAD_DIRECTORY}/{}/{filename}", Uuid::now_v7());
        let path = state
            .wrappers
            .realpath(&uri)
            .ok_or_else(|| AppError::Internal(format!("Unresolvable upload URI {uri}")))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {e}")))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

        let file = state
            .store
            .create_file(&NewFile {
                owner: user.as_ref().map(|u| u.user_id),
                filename,
                uri,
                filemime,
                status: FileStatus::Temporary,
            })
            .await?;
        tracing::info!("Stored upload {} as file {}", file.uri, file.fid);
        uploaded.push(file);
    }

    let first = uploaded
        .first()
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    Ok(Json(json!({
        "fid": first.fid,
        "fids": uploaded.iter().map(|f| f.fid).collect::<Vec<_>>(),
    })))
}

/// Downloads a retained bundle from the retrieval folder.
pub async fn retrieve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<RetrieveQuery>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound("File not found".to_string());

    let name = query
        .file
        .filter(|name| files::is_safe_segment(name))
        .ok_or_else(not_found)?;

    let folder = &state.config.files.retrieval_folder;
    let filename = format!("{name}.zip");
    let uri = format!("{folder}/{filename}");
    let path = state.wrappers.realpath(&uri).ok_or_else(not_found)?;

    let record = match state.store.find_file_by_uri(&uri).await? {
        Some(record) => record,
        None => {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(not_found());
            }
            state
                .store
                .create_file(&NewFile::permanent(Some(auth.user_id), &filename, &uri))
                .await?
        }
    };

    let bytes = tokio::fs::read(&path).await.map_err(|_| not_found())?;

    tracing::info!("File {} retrieved by {}", record.uri, auth.user_id);

    Ok((
        [
            (header::CONTENT_TYPE, record.filemime),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment;filename=\"{}\"", record.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
