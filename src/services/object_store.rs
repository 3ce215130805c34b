//! src/services/object_store.rs
//!
//! ObjectStore: the payload side of an evidence upload. The trait is what
//! the upload pipeline talks to; `LocalObjectStore` keeps payloads on local
//! disk sharded beneath `base_path/{shard}/{shard}/{key}` and hands out
//! public URLs rooted at a configured base URL.

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("object `{0}` already exists")]
    ObjectAlreadyExists(String),
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Blob storage used by the upload pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return the key actually written.
    ///
    /// Keys are never overwritten: writing an existing key fails with
    /// `ObjectAlreadyExists`.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Remove the payload stored under `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Public locator for `key`. Pure; performs no I/O.
    fn public_url(&self, key: &str) -> String;
}

const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Disk-backed object store.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,

    /// URL prefix under which `/objects/{*key}` is served.
    pub base_url: String,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    ///
    /// Rejects keys that begin with `/`, contain `..`, backslashes or
    /// control characters.
    fn ensure_key_safe(&self, key: &str) -> StorageResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StorageError::InvalidObjectKey);
        }
        if key.starts_with('/') || key.contains("..") {
            return Err(StorageError::InvalidObjectKey);
        }
        if key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(StorageError::InvalidObjectKey);
        }
        Ok(())
    }

    /// Two-level shard identifiers: first two bytes of MD5(key) as hex.
    fn object_shards(key: &str) -> (String, String) {
        let digest = md5::compute(key);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Fully-qualified payload path. Parent directories may not exist yet.
    fn object_path(&self, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(key);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    /// Read a stored payload back.
    pub async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.ensure_key_safe(key)?;
        let path = self.object_path(key);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(key.to_string()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Recursively remove empty directories up to the base path.
    async fn prune_empty_dirs(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(&self.base_path) && current != self.base_path {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Writes to a temp file, fsyncs, then hard-links into place so an
    /// existing key is detected atomically.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        self.ensure_key_safe(key)?;

        let file_path = self.object_path(key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Backend("object path missing parent directory".to_string())
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));

        let write = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_all().await
        };
        if let Err(err) = write.await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        let linked = fs::hard_link(&tmp_path, &file_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        match linked {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::ObjectAlreadyExists(key.to_string()));
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        debug!(
            key = %key,
            size_bytes = data.len(),
            content_type = %content_type,
            "stored object payload"
        );
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.ensure_key_safe(key)?;
        let file_path = self.object_path(key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::ObjectNotFound(key.to_string()));
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }
        Ok(())
    }

    /// Each key segment is percent-encoded; `/` separators are kept.
    fn public_url(&self, key: &str) -> String {
        let path = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Ensure the storage root exists; used at startup and by readiness checks.
pub async fn ensure_base_dir(path: &Path) -> StorageResult<()> {
    if !fs::try_exists(path).await? {
        fs::create_dir_all(path).await?;
    }
    // Probe write permission early rather than on the first upload.
    let probe = path.join(format!(".probe-{}", Uuid::new_v4()));
    OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)
        .await?;
    fs::remove_file(&probe).await?;
    Ok(())
}
