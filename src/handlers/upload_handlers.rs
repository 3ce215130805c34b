//! Multipart evidence upload.

use crate::{
    errors::AppError,
    handlers::auth::CurrentUser,
    services::upload_orchestrator::{UploadFile, UploadRequest},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

/// `POST /evidence`
///
/// Form fields: `event_id`, `category`, optional `note`, and one or more
/// file parts (any part carrying a file name). Responds 201 when every file
/// was stored and recorded, 207 with per-file outcomes when some failed,
/// and 400 when the event, category or files are missing.
pub async fn upload_evidence(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let request = read_form(multipart, user.id).await?;
    let outcome = state.uploads.upload_batch(request).await?;
    tracing::info!(
        event_id = %outcome.event_id,
        user_id = %user.id,
        "upload batch reported: {}",
        outcome.message()
    );
    let status = if outcome.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome)))
}

async fn read_form(mut multipart: Multipart, user_id: Uuid) -> Result<UploadRequest, AppError> {
    let mut request = UploadRequest {
        event_id: None,
        category: None,
        note: None,
        user_id,
        submitted_at: Utc::now(),
        files: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if let Some(filename) = field.file_name().map(str::to_string) {
            let data = field.bytes().await.map_err(bad_multipart)?;
            if !filename.is_empty() && !data.is_empty() {
                request.files.push(UploadFile { filename, data });
            }
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "event_id" => {
                let value = value.trim();
                if !value.is_empty() {
                    let id = Uuid::parse_str(value)
                        .map_err(|_| AppError::bad_request(format!("invalid event_id `{}`", value)))?;
                    request.event_id = Some(id);
                }
            }
            "category" => request.category = Some(value),
            "note" => request.note = Some(value),
            other => tracing::debug!("ignoring form field `{}`", other),
        }
    }

    Ok(request)
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}
