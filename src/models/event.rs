//! Represents an event that evidence photos are attached to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named, dated activity.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Event {
    /// Unique identifier for this event.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Calendar date the event takes place on.
    pub date: NaiveDate,

    /// Admin who created the event.
    pub created_by: Uuid,

    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Payload accepted when creating an event.
///
/// Fields are optional so that missing values reach validation instead of
/// failing JSON deserialization.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct NewEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}
