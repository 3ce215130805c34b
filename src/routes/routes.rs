//! Defines routes for events, evidence uploads and stored photos.
//!
//! ## Structure
//! - **Probes**
//!   - `GET    /healthz`, `GET /readyz`
//!
//! - **Events** (bearer token required)
//!   - `GET    /events`: list events
//!   - `POST   /events`: create event (admins only)
//!   - `GET    /events/{id}`: event with photos grouped by category
//!
//! - **Evidence** (bearer token required)
//!   - `POST   /evidence`: multipart batch upload
//!
//! - **Objects** (public)
//!   - `GET    /objects/{*key}`: stored photo payload

use crate::{
    handlers::{
        event_handlers::{create_event, get_event, list_events},
        health_handlers::{healthz, readyz},
        object_handlers::get_object,
        upload_handlers::upload_evidence,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router. `max_upload_bytes` caps the size of an upload request
/// body, all files of a batch included.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route(
            "/evidence",
            post(upload_evidence).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/objects/{*key}", get(get_object))
}
