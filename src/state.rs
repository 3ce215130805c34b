//! Shared handler state: every service the HTTP layer needs, injected once
//! at startup.

use crate::services::{
    auth::{AuthService, SqliteAuthService},
    compression::{BudgetCompressor, CompressionLimits},
    event_service::EventService,
    object_store::LocalObjectStore,
    record_store::SqliteRecordStore,
    upload_orchestrator::UploadOrchestrator,
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub auth: Arc<dyn AuthService>,
    pub events: EventService,
    pub records: SqliteRecordStore,
    pub objects: LocalObjectStore,
    pub uploads: UploadOrchestrator,
}

impl AppState {
    pub fn new(
        db: Arc<SqlitePool>,
        objects: LocalObjectStore,
        limits: CompressionLimits,
        redirect_after: Duration,
    ) -> Self {
        let records = SqliteRecordStore::new(db.clone());
        let uploads = UploadOrchestrator::new(
            Arc::new(BudgetCompressor::new(limits)),
            Arc::new(objects.clone()),
            Arc::new(records.clone()),
            redirect_after,
        );
        Self {
            auth: Arc::new(SqliteAuthService::new(db.clone())),
            events: EventService::new(db.clone()),
            records,
            objects,
            uploads,
            db,
        }
    }
}
