//! Event catalogue: listing, lookup and admin-only creation.

use crate::{
    models::{
        event::{Event, NewEvent},
        user::UserIdentity,
    },
    services::auth::{AuthError, require_admin},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event `{0}` not found")]
    EventNotFound(Uuid),
    #[error("Event name and date are required.")]
    MissingFields,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub type EventResult<T> = Result<T, EventError>;

#[derive(Clone)]
pub struct EventService {
    pub db: Arc<SqlitePool>,
}

impl EventService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All events, most recent date first.
    pub async fn list_events(&self) -> EventResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT id, name, description, date, created_by, created_at
             FROM events ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(events)
    }

    pub async fn get_event(&self, id: Uuid) -> EventResult<Event> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, description, date, created_by, created_at
             FROM events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(EventError::EventNotFound(id))
    }

    /// Create an event on behalf of `user`.
    ///
    /// Authorization is checked before the payload is looked at.
    pub async fn create_event(&self, user: &UserIdentity, new: NewEvent) -> EventResult<Event> {
        require_admin(user)?;

        let name = new
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(EventError::MissingFields)?;
        let date = new.date.ok_or(EventError::MissingFields)?;
        let description = new
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let event = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, name, description, date, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, name, description, date, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(date)
        .bind(user.id)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        .inspect_err(|err| tracing::error!("event insert failed: {}", err))?;

        tracing::info!(event_id = %event.id, name = %event.name, "created event");
        Ok(event)
    }
}
