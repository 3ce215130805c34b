//! Batch upload of evidence photos.
//!
//! Every file of a batch runs through its own spawned pipeline:
//! compress, store, resolve the public URL, record the evidence row. When the
//! record insert fails the stored object is deleted again so storage and
//! database stay in step. Pipelines never affect each other; the batch
//! waits for all of them and reports one aggregate status.

use crate::{
    models::evidence::{EvidenceRecord, NewEvidenceRecord},
    services::{
        compression::ImageCompressor, object_store::ObjectStore, record_store::RecordStore,
    },
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SUCCESS_MESSAGE: &str = "All files uploaded successfully! Redirecting...";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    #[error("Please select an event, a category, and at least one file.")]
    Validation,
    #[error("Compression failed for {file}: {reason}")]
    Compression { file: String, reason: String },
    #[error("Upload failed for {file}: {reason}")]
    Store { file: String, reason: String },
    #[error("Database insert failed for {file}: {reason}")]
    Insert { file: String, reason: String },
    #[error("Upload task failed for {file}: {reason}")]
    Task { file: String, reason: String },
}

/// One selected file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub data: Bytes,
}

/// A batch as submitted by a user. Event and category are optional here so
/// that missing selections are reported by validation.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub event_id: Option<Uuid>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub files: Vec<UploadFile>,
}

/// Context shared by every item of a validated batch.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub event_id: Uuid,
    pub category: String,
    pub note: Option<String>,
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl UploadContext {
    /// Storage key for the `index`-th file of the batch: unique per user,
    /// submission instant and position, followed by the file name. No
    /// content hashing.
    pub fn object_key(&self, index: usize, filename: &str) -> String {
        format!(
            "{}/{}_{}_{}",
            self.user_id,
            self.submitted_at.timestamp_millis(),
            index,
            sanitize_filename(filename)
        )
    }
}

/// Where a stored payload lives.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Outcome of a single file's pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    #[serde(flatten)]
    pub result: FileResult,
    /// Set when the compensating delete after a failed insert also failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileResult {
    Success {
        object: StoredObject,
        record: EvidenceRecord,
    },
    Error {
        #[serde(serialize_with = "serialize_display")]
        error: UploadError,
    },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, FileResult::Success { .. })
    }

    pub fn error(&self) -> Option<&UploadError> {
        match &self.result {
            FileResult::Error { error } => Some(error),
            FileResult::Success { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchStatus {
    Success {
        message: String,
        redirect_to: String,
        #[serde(rename = "redirect_after_ms", serialize_with = "serialize_millis")]
        redirect_after: Duration,
    },
    Error {
        message: String,
    },
}

/// Aggregate result of a batch; outcomes are in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub event_id: Uuid,
    pub status: BatchStatus,
    pub files: Vec<FileOutcome>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchStatus::Success { .. })
    }

    pub fn message(&self) -> &str {
        match &self.status {
            BatchStatus::Success { message, .. } | BatchStatus::Error { message } => message,
        }
    }
}

/// Lifecycle of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

/// Runs upload batches against injected services.
#[derive(Clone)]
pub struct UploadOrchestrator {
    compressor: Arc<dyn ImageCompressor>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    redirect_after: Duration,
}

impl UploadOrchestrator {
    pub fn new(
        compressor: Arc<dyn ImageCompressor>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        redirect_after: Duration,
    ) -> Self {
        Self {
            compressor,
            objects,
            records,
            redirect_after,
        }
    }

    /// Validate a request, run every file's pipeline concurrently and
    /// aggregate the outcomes.
    ///
    /// Returns `UploadError::Validation` without touching any service when
    /// no file, no event or no category was provided. Pipeline failures are
    /// reported through the returned `BatchOutcome`, never as `Err`.
    pub async fn upload_batch(&self, request: UploadRequest) -> Result<BatchOutcome, UploadError> {
        let mut state = BatchState::Idle;
        transition(&mut state, BatchState::Validating);

        let (ctx, files) = match validate(request) {
            Ok(valid) => valid,
            Err(err) => {
                transition(&mut state, BatchState::Failed);
                return Err(err);
            }
        };

        transition(&mut state, BatchState::Uploading);
        info!(
            event_id = %ctx.event_id,
            user_id = %ctx.user_id,
            category = %ctx.category,
            files = files.len(),
            "starting upload batch"
        );

        let ctx = Arc::new(ctx);
        let handles: Vec<_> = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let filename = file.filename.clone();
                let pipeline = Pipeline {
                    compressor: self.compressor.clone(),
                    objects: self.objects.clone(),
                    records: self.records.clone(),
                    ctx: ctx.clone(),
                    index,
                };
                (filename, tokio::spawn(async move { pipeline.run(file).await }))
            })
            .collect();

        let (filenames, joins): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes: Vec<FileOutcome> = join_all(joins)
            .await
            .into_iter()
            .zip(filenames)
            .map(|(joined, filename)| {
                joined.unwrap_or_else(|err| FileOutcome {
                    result: FileResult::Error {
                        error: UploadError::Task {
                            file: filename.clone(),
                            reason: err.to_string(),
                        },
                    },
                    filename,
                    orphaned_key: None,
                })
            })
            .collect();

        let status = match outcomes.iter().find_map(FileOutcome::error) {
            None => BatchStatus::Success {
                message: SUCCESS_MESSAGE.to_string(),
                redirect_to: format!("/events/{}", ctx.event_id),
                redirect_after: self.redirect_after,
            },
            Some(first) => BatchStatus::Error {
                message: first.to_string(),
            },
        };

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        if matches!(status, BatchStatus::Success { .. }) {
            transition(&mut state, BatchState::Succeeded);
        } else {
            transition(&mut state, BatchState::Failed);
        }
        info!(
            event_id = %ctx.event_id,
            succeeded,
            failed = outcomes.len() - succeeded,
            "finished upload batch"
        );

        Ok(BatchOutcome {
            event_id: ctx.event_id,
            status,
            files: outcomes,
        })
    }
}

fn transition(state: &mut BatchState, next: BatchState) {
    debug!(from = ?state, to = ?next, "upload batch state");
    *state = next;
}

fn validate(request: UploadRequest) -> Result<(UploadContext, Vec<UploadFile>), UploadError> {
    let category = request
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    match (request.event_id, category) {
        (Some(event_id), Some(category)) if !request.files.is_empty() => {
            let note = request
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            Ok((
                UploadContext {
                    event_id,
                    category,
                    note,
                    user_id: request.user_id,
                    submitted_at: request.submitted_at,
                },
                request.files,
            ))
        }
        _ => Err(UploadError::Validation),
    }
}

/// Services and shared context for one file's pipeline.
struct Pipeline {
    compressor: Arc<dyn ImageCompressor>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    ctx: Arc<UploadContext>,
    index: usize,
}

impl Pipeline {
    async fn run(self, file: UploadFile) -> FileOutcome {
        let filename = file.filename.clone();
        let mut orphaned_key = None;
        let result = match self.execute(file, &mut orphaned_key).await {
            Ok((object, record)) => FileResult::Success { object, record },
            Err(error) => {
                warn!(event_id = %self.ctx.event_id, file = %filename, "{}", error);
                FileResult::Error { error }
            }
        };
        FileOutcome {
            filename,
            result,
            orphaned_key,
        }
    }

    async fn execute(
        &self,
        file: UploadFile,
        orphaned_key: &mut Option<String>,
    ) -> Result<(StoredObject, EvidenceRecord), UploadError> {
        let UploadFile { filename, data } = file;

        let compressed = self
            .compressor
            .compress(&filename, data)
            .await
            .map_err(|err| UploadError::Compression {
                file: filename.clone(),
                reason: err.to_string(),
            })?;

        let key = self.ctx.object_key(self.index, &filename);
        let key = self
            .objects
            .put(&key, compressed.data, compressed.content_type)
            .await
            .map_err(|err| UploadError::Store {
                file: filename.clone(),
                reason: err.to_string(),
            })?;

        let url = self.objects.public_url(&key);

        let inserted = self
            .records
            .insert(NewEvidenceRecord {
                event_id: self.ctx.event_id,
                user_id: self.ctx.user_id,
                category: self.ctx.category.clone(),
                note: self.ctx.note.clone(),
                photo_url: url.clone(),
            })
            .await;

        match inserted {
            Ok(record) => {
                debug!(file = %filename, key = %key, record_id = %record.id, "recorded evidence");
                Ok((StoredObject { key, url }, record))
            }
            Err(err) => {
                if let Err(delete_err) = self.objects.delete(&key).await {
                    warn!(
                        file = %filename,
                        key = %key,
                        "compensating delete failed, object left behind: {}",
                        delete_err
                    );
                    *orphaned_key = Some(key);
                }
                Err(UploadError::Insert {
                    file: filename,
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Last path segment of a client-supplied name, with characters that are
/// unsafe in storage keys replaced.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn serialize_display<S: serde::Serializer>(err: &UploadError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        compression::{CompressedImage, CompressionError},
        object_store::{StorageError, StorageResult},
        record_store::{RecordError, RecordResult},
    };
    use async_trait::async_trait;
    use std::{
        collections::{HashMap, HashSet},
        sync::Mutex,
    };

    const VALIDATION_MESSAGE: &str = "Please select an event, a category, and at least one file.";

    /// Passes bytes through; fails for names in `fail`.
    #[derive(Default)]
    struct FakeCompressor {
        fail: HashSet<String>,
    }

    #[async_trait]
    impl ImageCompressor for FakeCompressor {
        async fn compress(
            &self,
            filename: &str,
            data: Bytes,
        ) -> Result<CompressedImage, CompressionError> {
            if self.fail.contains(filename) {
                return Err(CompressionError::UnsupportedFormat);
            }
            Ok(CompressedImage {
                data,
                content_type: "image/jpeg",
                width: 1,
                height: 1,
            })
        }
    }

    #[derive(Default)]
    struct FakeObjectStore {
        objects: Mutex<HashMap<String, Bytes>>,
        fail_put_for: HashSet<String>,
        fail_delete: bool,
        puts: Mutex<usize>,
        deletes: Mutex<Vec<String>>,
    }

    impl FakeObjectStore {
        fn keys(&self) -> HashSet<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        fn calls(&self) -> usize {
            *self.puts.lock().unwrap() + self.deletes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStore for FakeObjectStore {
        async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
            *self.puts.lock().unwrap() += 1;
            if self.fail_put_for.iter().any(|name| key.ends_with(name.as_str())) {
                return Err(StorageError::Backend("bucket unavailable".into()));
            }
            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(key) {
                return Err(StorageError::ObjectAlreadyExists(key.to_string()));
            }
            objects.insert(key.to_string(), data);
            Ok(key.to_string())
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.deletes.lock().unwrap().push(key.to_string());
            if self.fail_delete {
                return Err(StorageError::Backend("delete refused".into()));
            }
            self.objects
                .lock()
                .unwrap()
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.test/{key}")
        }
    }

    /// Fails inserts whose URL ends with one of `fail_for`.
    #[derive(Default)]
    struct FakeRecordStore {
        rows: Mutex<Vec<EvidenceRecord>>,
        fail_for: HashSet<String>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl RecordStore for FakeRecordStore {
        async fn insert(&self, record: NewEvidenceRecord) -> RecordResult<EvidenceRecord> {
            *self.calls.lock().unwrap() += 1;
            if self.fail_for.iter().any(|name| record.photo_url.ends_with(name.as_str())) {
                return Err(RecordError::Rejected("constraint violated".into()));
            }
            let row = EvidenceRecord {
                id: Uuid::new_v4(),
                event_id: record.event_id,
                user_id: record.user_id,
                category: record.category,
                note: record.note,
                photo_url: record.photo_url,
                created_at: Utc::now(),
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }
    }

    struct Harness {
        compressor: Arc<FakeCompressor>,
        objects: Arc<FakeObjectStore>,
        records: Arc<FakeRecordStore>,
    }

    impl Harness {
        fn new(objects: FakeObjectStore, records: FakeRecordStore) -> Self {
            Self::with_compressor(FakeCompressor::default(), objects, records)
        }

        fn with_compressor(
            compressor: FakeCompressor,
            objects: FakeObjectStore,
            records: FakeRecordStore,
        ) -> Self {
            Self {
                compressor: Arc::new(compressor),
                objects: Arc::new(objects),
                records: Arc::new(records),
            }
        }

        fn orchestrator(&self) -> UploadOrchestrator {
            UploadOrchestrator::new(
                self.compressor.clone(),
                self.objects.clone(),
                self.records.clone(),
                Duration::from_secs(2),
            )
        }

        fn rows(&self) -> Vec<EvidenceRecord> {
            self.records.rows.lock().unwrap().clone()
        }
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn request(event_id: Uuid, files: &[&str]) -> UploadRequest {
        UploadRequest {
            event_id: Some(event_id),
            category: Some("site_visit".into()),
            note: Some("  north gate ".into()),
            user_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            files: files
                .iter()
                .map(|name| UploadFile {
                    filename: name.to_string(),
                    data: Bytes::from(format!("payload of {name}")),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn all_files_succeed() {
        let h = Harness::new(FakeObjectStore::default(), FakeRecordStore::default());
        let event_id = Uuid::new_v4();

        let outcome = h
            .orchestrator()
            .upload_batch(request(event_id, &["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            outcome.status,
            BatchStatus::Success {
                message: SUCCESS_MESSAGE.into(),
                redirect_to: format!("/events/{event_id}"),
                redirect_after: Duration::from_secs(2),
            }
        );
        let rows = h.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.category == "site_visit"));
        assert!(rows.iter().all(|r| r.note.as_deref() == Some("north gate")));
        assert_eq!(h.objects.keys().len(), 3);
        let files: Vec<_> = outcome.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(files, ["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn validation_short_circuits_all_io() {
        let event_id = Uuid::new_v4();
        let mut no_files = request(event_id, &[]);
        no_files.files.clear();
        let mut no_event = request(event_id, &["a.jpg"]);
        no_event.event_id = None;
        let mut no_category = request(event_id, &["a.jpg"]);
        no_category.category = Some("   ".into());

        for req in [no_files, no_event, no_category] {
            let h = Harness::new(FakeObjectStore::default(), FakeRecordStore::default());
            let err = h.orchestrator().upload_batch(req).await.unwrap_err();
            assert_eq!(err, UploadError::Validation);
            assert_eq!(err.to_string(), VALIDATION_MESSAGE);
            assert_eq!(h.objects.calls(), 0);
            assert_eq!(*h.records.calls.lock().unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn store_failure_on_one_file_leaves_siblings_intact() {
        let h = Harness::new(
            FakeObjectStore {
                fail_put_for: names(&["2.jpg"]),
                ..Default::default()
            },
            FakeRecordStore::default(),
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["1.jpg", "2.jpg", "3.jpg"]))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            outcome.message(),
            "Upload failed for 2.jpg: bucket unavailable"
        );
        assert!(outcome.files[0].is_success());
        assert!(matches!(
            outcome.files[1].error(),
            Some(UploadError::Store { .. })
        ));
        assert!(outcome.files[2].is_success());
        assert_eq!(h.rows().len(), 2);
        assert_eq!(h.objects.keys().len(), 2);
        assert!(h.objects.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_deletes_the_stored_object() {
        let h = Harness::new(
            FakeObjectStore::default(),
            FakeRecordStore {
                fail_for: names(&["only.jpg"]),
                ..Default::default()
            },
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["only.jpg"]))
            .await
            .unwrap();

        assert_eq!(
            outcome.message(),
            "Database insert failed for only.jpg: constraint violated"
        );
        assert!(h.rows().is_empty());
        assert!(h.objects.keys().is_empty());
        assert_eq!(h.objects.deletes.lock().unwrap().len(), 1);
        assert_eq!(outcome.files[0].orphaned_key, None);
    }

    #[tokio::test]
    async fn insert_failure_only_rolls_back_its_own_file() {
        let h = Harness::new(
            FakeObjectStore::default(),
            FakeRecordStore {
                fail_for: names(&["bad.jpg"]),
                ..Default::default()
            },
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["good.jpg", "bad.jpg"]))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        let good = match &outcome.files[0].result {
            FileResult::Success { object, .. } => object.clone(),
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(h.objects.keys(), HashSet::from([good.key.clone()]));
        assert_eq!(h.rows().len(), 1);
        assert_eq!(h.rows()[0].photo_url, good.url);
    }

    #[tokio::test]
    async fn failed_compensation_is_reported_as_orphan() {
        let h = Harness::new(
            FakeObjectStore {
                fail_delete: true,
                ..Default::default()
            },
            FakeRecordStore {
                fail_for: names(&["x.jpg"]),
                ..Default::default()
            },
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["x.jpg"]))
            .await
            .unwrap();

        assert!(matches!(
            outcome.files[0].error(),
            Some(UploadError::Insert { .. })
        ));
        let orphan = outcome.files[0].orphaned_key.clone().unwrap();
        assert!(h.objects.keys().contains(&orphan));
    }

    #[tokio::test]
    async fn compression_failure_skips_storage_for_that_file() {
        let h = Harness::with_compressor(
            FakeCompressor {
                fail: names(&["broken.heic"]),
            },
            FakeObjectStore::default(),
            FakeRecordStore::default(),
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["broken.heic", "fine.jpg"]))
            .await
            .unwrap();

        assert_eq!(
            outcome.message(),
            "Compression failed for broken.heic: unsupported image format"
        );
        assert_eq!(*h.objects.puts.lock().unwrap(), 1);
        assert_eq!(h.rows().len(), 1);
    }

    #[tokio::test]
    async fn first_failure_in_input_order_is_reported() {
        let h = Harness::new(
            FakeObjectStore {
                fail_put_for: names(&["c.jpg"]),
                ..Default::default()
            },
            FakeRecordStore {
                fail_for: names(&["b.jpg"]),
                ..Default::default()
            },
        );

        let outcome = h
            .orchestrator()
            .upload_batch(request(Uuid::new_v4(), &["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert!(outcome.message().starts_with("Database insert failed for b.jpg"));
    }

    #[tokio::test]
    async fn resubmitting_creates_independent_objects_and_records() {
        let h = Harness::new(FakeObjectStore::default(), FakeRecordStore::default());
        let first = request(Uuid::new_v4(), &["a.jpg"]);
        let mut second = first.clone();
        second.submitted_at = first.submitted_at + chrono::Duration::milliseconds(5);

        let orchestrator = h.orchestrator();
        assert!(orchestrator.upload_batch(first).await.unwrap().is_success());
        assert!(orchestrator.upload_batch(second).await.unwrap().is_success());

        assert_eq!(h.objects.keys().len(), 2);
        assert_eq!(h.rows().len(), 2);
    }

    #[test]
    fn object_keys_combine_user_instant_and_name() {
        let ctx = UploadContext {
            event_id: Uuid::nil(),
            category: "c".into(),
            note: None,
            user_id: Uuid::nil(),
            submitted_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        };
        assert_eq!(
            ctx.object_key(3, "../../etc/IMG 1.jpg"),
            "00000000-0000-0000-0000-000000000000/1700000000123_3_IMG 1.jpg"
        );
    }

    #[tokio::test]
    async fn same_name_files_in_one_batch_get_distinct_keys() {
        let h = Harness::new(FakeObjectStore::default(), FakeRecordStore::default());

        let outcome = h
            .orchestrator()
            .upload_batch(request(
                Uuid::new_v4(),
                &["phoneA/IMG_0001.PNG", "IMG_0001.PNG", "phoneB/IMG_0001.PNG"],
            ))
            .await
            .unwrap();

        assert!(outcome.is_success(), "{}", outcome.message());
        assert_eq!(h.objects.keys().len(), 3);
        assert_eq!(h.rows().len(), 3);
    }

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(sanitize_filename("C:\\photos\\a.png"), "a.png");
        assert_eq!(sanitize_filename("..hidden"), "hidden");
        assert_eq!(sanitize_filename("a..b.png"), "a_b.png");
        assert_eq!(sanitize_filename("what?#.jpg"), "what__.jpg");
        assert_eq!(sanitize_filename("dir/"), "file");
    }

    #[test]
    fn outcome_serializes_for_clients() {
        let outcome = BatchOutcome {
            event_id: Uuid::nil(),
            status: BatchStatus::Error {
                message: "Upload failed for a.jpg: nope".into(),
            },
            files: vec![FileOutcome {
                filename: "a.jpg".into(),
                result: FileResult::Error {
                    error: UploadError::Store {
                        file: "a.jpg".into(),
                        reason: "nope".into(),
                    },
                },
                orphaned_key: None,
            }],
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"]["type"], "error");
        assert_eq!(json["files"][0]["status"], "error");
        assert_eq!(json["files"][0]["error"], "Upload failed for a.jpg: nope");
        assert!(json["files"][0].get("orphaned_key").is_none());
    }
}
