//! upload executor - Store a local file in the bucket
//!
//! The object key is the file's base name; directory components of the given
//! path are dropped.

use std::fmt;
use std::path::{Path, PathBuf};

use bkt_core::path::upload_key;
use bkt_core::{Error, ObjectStore, Result};
use serde::Serialize;

use crate::output::{OutputConfig, TransferProgress};

/// Outcome of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct Uploaded {
    pub path: PathBuf,
    pub key: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl fmt::Display for Uploaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully uploaded {} as {} ({} bytes)",
            self.path.display(),
            self.key,
            self.size_bytes
        )
    }
}

/// Upload the file at `path` to `bucket`
pub async fn execute<S>(
    store: &S,
    bucket: &str,
    path: &Path,
    output: &OutputConfig,
) -> Result<Uploaded>
where
    S: ObjectStore + ?Sized,
{
    let key = upload_key(path)?;

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.is_dir() {
        return Err(Error::LocalIo(std::io::Error::other(format!(
            "{} is a directory",
            path.display()
        ))));
    }
    let data = tokio::fs::read(path).await?;

    let content_type = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());

    let spinner = TransferProgress::upload(output, &key);
    let result = store
        .put_object(bucket, &key, data, content_type.clone())
        .await;
    spinner.finish();
    let info = result?;

    tracing::debug!(key, size = info.size_bytes, "upload complete");
    Ok(Uploaded {
        path: path.to_path_buf(),
        key,
        size_bytes: info.size_bytes,
        content_type,
    })
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

    #[tokio::test]
    async fn test_upload_uses_base_name() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports");
        std::fs::create_dir(&nested).unwrap();
        let file = nested.join("q1.csv");
        std::fs::write(&file, "a,b\n1,2\n").unwrap();

        let outcome = execute(&store, "bucket", &file, &quiet()).await.unwrap();

        assert_eq!(outcome.key, "q1.csv");
        assert_eq!(outcome.size_bytes, 8);
        assert_eq!(outcome.content_type.as_deref(), Some("text/csv"));
        assert_eq!(store.contents("bucket", "q1.csv").unwrap(), b"a,b\n1,2\n");
        assert_eq!(store.keys("bucket"), vec!["q1.csv"]);
    }

    #[tokio::test]
    async fn test_upload_replaces_existing_object() {
        let store = MemoryStore::new();
        store.insert("bucket", "b.txt", "old");
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("b.txt");
        std::fs::write(&file, "new content").unwrap();

        execute(&store, "bucket", &file, &quiet()).await.unwrap();

        assert_eq!(store.contents("bucket", "b.txt").unwrap(), b"new content");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_local_io() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        let dir = TempDir::new().unwrap();

        let err = execute(&store, "bucket", &dir.path().join("nope.txt"), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalIo(_)));
        assert!(store.keys("bucket").is_empty());
    }

    #[tokio::test]
    async fn test_upload_directory_is_local_io() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        let dir = TempDir::new().unwrap();

        let err = execute(&store, "bucket", dir.path(), &quiet())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LocalIo(_)));
    }

    #[tokio::test]
    async fn test_upload_remote_failure() {
        let store = MemoryStore::new();
        store.create_bucket("bucket");
        store.fail(Operation::Put);
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("b.txt");
        std::fs::write(&file, "data").unwrap();

        let err = execute(&store, "bucket", &file, &quiet()).await.unwrap_err();

        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
