//! download executor - Copy one object into a local file
//!
//! The body is streamed into a hidden sibling file and renamed onto the
//! destination only once complete, so a failed transfer never leaves a
//! truncated file behind or clobbers an existing one.

use std::fmt;
use std::path::{Path, PathBuf};

use bkt_core::path::{download_target, partial_path};
use bkt_core::{Error, ObjectBody, ObjectStore, Result};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::output::{OutputConfig, TransferProgress};

/// Outcome of a successful download
#[derive(Debug, Clone, Serialize)]
pub struct Downloaded {
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl fmt::Display for Downloaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully downloaded object: {} ({} bytes)",
            self.key, self.size_bytes
        )
    }
}

/// Download `key` from `bucket` into `dest_dir/<key>`
pub async fn execute<S>(
    store: &S,
    bucket: &str,
    key: &str,
    dest_dir: &Path,
    output: &OutputConfig,
) -> Result<Downloaded>
where
    S: ObjectStore + ?Sized,
{
    let target = download_target(dest_dir, key)?;
    let body = store.get_object(bucket, key).await?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(&target);
    let progress = TransferProgress::download(output, key, body.content_length);

    let result = write_body(&partial, body, &progress).await;
    progress.finish();

    let size_bytes = match result {
        Ok(written) => written,
        Err(e) => {
            discard(&partial).await;
            return Err(e);
        }
    };

    if let Err(e) = tokio::fs::rename(&partial, &target).await {
        discard(&partial).await;
        return Err(Error::LocalIo(e));
    }

    tracing::debug!(key, path = %target.display(), size_bytes, "download complete");
    Ok(Downloaded {
        key: key.to_string(),
        path: target,
        size_bytes,
    })
}

async fn write_body(path: &Path, body: ObjectBody, progress: &TransferProgress) -> Result<u64> {
    let expected = body.content_length;
    let mut chunks = body.chunks;
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress.advance(chunk.len() as u64);
    }

    file.flush().await?;
    file.sync_all().await?;

    if let Some(expected) = expected {
        if written != expected {
            return Err(Error::StoreUnavailable(format!(
                "body ended after {written} of {expected} bytes"
            )));
        }
    }

    Ok(written)
}

async fn discard(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %partial.display(), "failed to remove partial download: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use bkt_core::memory::Operation;
    use bkt_core::MemoryStore;
    use tempfile::TempDir;

    use super::*;

    fn quiet() -> OutputConfig {
        OutputConfig {
            no_progress: true,
            ..Default::default()
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let store = MemoryStore::new().with_chunk_size(3);
        store.insert("bucket", "a.txt", "0123456789");
        let dir = TempDir::new().unwrap();

        let outcome = execute(&store, "bucket", "a.txt", dir.path(), &quiet())
            .await
            .unwrap();

        assert_eq!(outcome.size_bytes, 10);
        assert_eq!(outcome.path, dir.path().join("a.txt"));
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"0123456789");
        assert!(outcome.to_string().contains("a.txt"));
        assert_eq!(dir_entries(dir.path()), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_download_key_near_name_limit() {
        let key = format!("{}.bin", "k".repeat(246));
        let store = MemoryStore::new();
        store.insert("bucket", &key, "payload");
        let dir = TempDir::new().unwrap();

        execute(&store, "bucket", &key, dir.path(), &quiet())
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), b"payload");
        assert_eq!(dir_entries(dir.path()), vec![key]);
    }

    #[tokio::test]
    async fn test_download_nested_key_creates_directories() {
        let store = MemoryStore::new();
        store.insert("bucket", "logs/2024/app.log", "line\n");
        let dir = TempDir::new().unwrap();

        execute(&store, "bucket", "logs/2024/app.log", dir.path(), &quiet())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("logs/2024/app.log")).unwrap(),
            "line\n"
        );
    }

    #[tokio::test]
    async fn test_download_missing_key_creates_nothing() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        let dir = TempDir::new().unwrap();

        let err = execute(&store, "bucket", "ghost.txt", dir.path(), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_interrupted_download_keeps_existing_file() {
        let store = MemoryStore::new().with_chunk_size(4);
        store.insert("bucket", "a.txt", "0123456789");
        store.break_streams_after(6);
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "previous").unwrap();

        let err = execute(&store, "bucket", "a.txt", dir.path(), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "previous"
        );
        assert_eq!(dir_entries(dir.path()), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_no_partial_file() {
        let store = MemoryStore::new().with_chunk_size(4);
        store.insert("bucket", "a.txt", "0123456789");
        store.break_streams_after(6);
        let dir = TempDir::new().unwrap();

        assert!(execute(&store, "bucket", "a.txt", dir.path(), &quiet())
            .await
            .is_err());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_local_write_failure_is_local_io() {
        let store = MemoryStore::new();
        store.insert("bucket", "a.txt", "data");
        let dir = TempDir::new().unwrap();
        // A regular file where the destination directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = execute(&store, "bucket", "a.txt", &blocker, &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalIo(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_is_store_unavailable() {
        let store = MemoryStore::new();
        store.insert("bucket", "a.txt", "data");
        store.fail(Operation::Get);
        let dir = TempDir::new().unwrap();

        let err = execute(&store, "bucket", "a.txt", dir.path(), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_escaping_key_is_rejected_before_request() {
        let store = MemoryStore::new();
        store.fail(Operation::Get);
        let dir = TempDir::new().unwrap();

        let err = execute(&store, "bucket", "../outside", dir.path(), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
