//! HTTP handlers for events and their photo galleries.

use crate::{
    errors::AppError,
    handlers::auth::CurrentUser,
    models::event::{Event, NewEvent},
    services::gallery::{GallerySection, group_by_category},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

/// Event page payload: the event plus its photos grouped by category.
#[derive(Debug, Serialize)]
pub struct EventGallery {
    pub event: Event,
    pub sections: Vec<GallerySection>,
}

/// `GET /events`: every event, most recent date first.
pub async fn list_events(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.events.list_events().await?))
}

/// `POST /events`: admin only.
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.events.create_event(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/{id}`: event details with the grouped gallery.
pub async fn get_event(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventGallery>, AppError> {
    let event = state.events.get_event(id).await?;
    let photos = state.records.list_for_event(event.id).await?;
    Ok(Json(EventGallery {
        sections: group_by_category(photos),
        event,
    }))
}
