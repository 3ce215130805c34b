//! Evidence photo rows and the insert payload used by the upload pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored photo linked to an event, uploader and category.
///
/// `photo_url` is the public locator of the object written by the
/// object store. A row only exists once its object exists.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub note: Option<String>,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an evidence row.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvidenceRecord {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub note: Option<String>,
    pub photo_url: String,
}

/// An evidence row joined with its uploader's profile, as shown in the
/// gallery.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct EvidencePhoto {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: EvidenceRecord,
    pub uploader_name: Option<String>,
    pub uploader_email: Option<String>,
}
