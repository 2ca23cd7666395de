//! delete executor - Remove one object from the bucket

use std::fmt;

use bkt_core::{Error, ObjectStore, Result};
use serde::Serialize;

/// Outcome of a delete. Deleting a key that did not exist is also a success.
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub key: String,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Successfully deleted object: {}", self.key)
    }
}

/// Delete `key` from `bucket`
pub async fn execute<S>(store: &S, bucket: &str, key: &str) -> Result<Deleted>
where
    S: ObjectStore + ?Sized,
{
    if key.is_empty() {
        return Err(Error::InvalidInput("object key cannot be empty".into()));
    }

    store.delete_object(bucket, key).await?;

    tracing::debug!(bucket, key, "delete complete");
    Ok(Deleted {
        key: key.to_string(),
    })
}
