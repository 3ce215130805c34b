//! Evidence rows: the trait the upload pipeline records through, and its
//! SQLite implementation.

use crate::models::evidence::{EvidencePhoto, EvidenceRecord, NewEvidenceRecord};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Relational storage for evidence rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: NewEvidenceRecord) -> RecordResult<EvidenceRecord>;
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    pub db: Arc<SqlitePool>,
}

impl SqliteRecordStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Photos of one event with the uploader's name and email, oldest first.
    pub async fn list_for_event(&self, event_id: Uuid) -> RecordResult<Vec<EvidencePhoto>> {
        let rows = sqlx::query_as::<_, EvidencePhoto>(
            "SELECT p.id, p.event_id, p.user_id, p.category, p.note, p.photo_url,
                    p.created_at, u.name AS uploader_name, u.email AS uploader_email
             FROM evidence_photos p
             LEFT JOIN users u ON u.id = p.user_id
             WHERE p.event_id = ?
             ORDER BY p.created_at ASC, p.rowid ASC",
        )
        .bind(event_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewEvidenceRecord) -> RecordResult<EvidenceRecord> {
        let inserted = sqlx::query_as::<_, EvidenceRecord>(
            r#"
            INSERT INTO evidence_photos (
                id, event_id, user_id, category, note, photo_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, event_id, user_id, category, note, photo_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.event_id)
        .bind(record.user_id)
        .bind(&record.category)
        .bind(&record.note)
        .bind(&record.photo_url)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                RecordError::Rejected(format!(
                    "event `{}` or user `{}` does not exist",
                    record.event_id, record.user_id
                ))
            }
            other => RecordError::Sqlx(other),
        })?;
        Ok(inserted)
    }
}
