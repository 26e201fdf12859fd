//! Raw-extract blob storage for sortfeed.
//!
//! The operational deployment mounts a remote object container; the
//! interface below is the byte store the pipeline is written against:
//! path-addressed get/put/rename where "not found" is distinguishable from
//! every other failure, because a missing sibling file is a normal
//! condition for the ingestion pipeline.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

pub const CRATE_NAME: &str = "sortfeed-storage";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("blob already exists and overwrite was not requested: {0}")]
    AlreadyExists(String),
    #[error("blob i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Receipt returned by a successful `put`.
#[derive(Debug, Clone)]
pub struct PutReceipt {
    pub path: String,
    pub byte_size: usize,
    pub content_hash: String,
    /// True when the put overwrote a previously stored blob.
    pub replaced: bool,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Vec<u8>, BlobError>;
    async fn put(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<PutReceipt, BlobError>;
    async fn rename(&self, from: &str, to: &str) -> Result<(), BlobError>;
}

/// Deterministic archive path for one raw extract:
/// `{site}/0_raw_data/Extractions_quoti/{YYYYMMDD}/{file_name}`.
pub fn extract_blob_path(site: &str, reporting_date: NaiveDate, file_name: &str) -> String {
    format!(
        "{site}/0_raw_data/Extractions_quoti/{}/{file_name}",
        reporting_date.format("%Y%m%d")
    )
}

/// Filesystem-backed blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

fn io_error(path: &str, source: std::io::Error) -> BlobError {
    BlobError::Io {
        path: path.to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        match fs::read(self.absolute(path)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(err) => Err(io_error(path, err)),
        }
    }

    /// Store bytes via temp-file write plus atomic rename, so a concurrent
    /// reader never observes a half-written blob.
    async fn put(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<PutReceipt, BlobError> {
        let absolute = self.absolute(path);
        let replaced = fs::try_exists(&absolute)
            .await
            .map_err(|err| io_error(path, err))?;
        if replaced && !overwrite {
            return Err(BlobError::AlreadyExists(path.to_string()));
        }

        let parent = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent)
            .await
            .map_err(|err| io_error(path, err))?;

        let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .map_err(|err| io_error(path, err))?;
        if let Err(err) = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await
        {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(path, err));
        }
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &absolute).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(path, err));
        }

        let content_hash = Self::sha256_hex(bytes);
        info!(path, bytes = bytes.len(), replaced, %content_hash, "stored extract blob");
        Ok(PutReceipt {
            path: path.to_string(),
            byte_size: bytes.len(),
            content_hash,
            replaced,
        })
    }

    /// Copies the blob to the new path; the source is left in place, which
    /// preserves the raw-archive history the way the operators expect.
    async fn rename(&self, from: &str, to: &str) -> Result<(), BlobError> {
        let bytes = self.get(from).await?;
        self.put(to, &bytes, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn extract_path_is_deterministic() {
        assert_eq!(
            extract_blob_path("PFC_LTH", date(2025, 4, 2), "Evenementsetdefauts.xlsx"),
            "PFC_LTH/0_raw_data/Extractions_quoti/20250402/Evenementsetdefauts.xlsx"
        );
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let receipt = store
            .put("LTH/0_raw_data/a.xlsx", b"payload", true)
            .await
            .expect("put");
        assert!(!receipt.replaced);
        assert_eq!(receipt.byte_size, 7);

        let bytes = store.get("LTH/0_raw_data/a.xlsx").await.expect("get");
        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn missing_blob_is_distinguishable_from_io_errors() {
        let dir = tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let err = store.get("LTH/absent.xlsx").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(path) if path == "LTH/absent.xlsx"));
    }

    #[tokio::test]
    async fn overwrite_is_last_write_wins() {
        let dir = tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        store.put("x/a.bin", b"first", true).await.expect("first put");
        let receipt = store.put("x/a.bin", b"second", true).await.expect("second put");
        assert!(receipt.replaced);
        assert_eq!(store.get("x/a.bin").await.expect("get"), b"second");
    }

    #[tokio::test]
    async fn put_without_overwrite_refuses_existing_blob() {
        let dir = tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        store.put("x/a.bin", b"first", false).await.expect("first put");
        let err = store.put("x/a.bin", b"second", false).await.unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists(_)));
        assert_eq!(store.get("x/a.bin").await.expect("get"), b"first");
    }

    #[tokio::test]
    async fn rename_copies_and_keeps_the_source() {
        let dir = tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        store.put("x/a.bin", b"data", true).await.expect("put");
        store.rename("x/a.bin", "y/b.bin").await.expect("rename");
        assert_eq!(store.get("y/b.bin").await.expect("copy"), b"data");
        assert_eq!(store.get("x/a.bin").await.expect("source"), b"data");
    }
}
