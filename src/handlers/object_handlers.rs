//! Public download of stored photo payloads.

use crate::{errors::AppError, state::AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

/// `GET /objects/{*key}`: the URL handed out as `photo_url`.
///
/// The content type is sniffed from the payload since compression may have
/// changed the format the file name suggests.
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let data = state.objects.get(&key).await?;
    let content_type = image::guess_format(&data)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    let length = data.len();

    let mut response = Response::new(Body::from(data));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    Ok(response)
}
